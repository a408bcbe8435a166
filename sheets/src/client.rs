//! Cliente HTTP para o serviço de sincronização de planilhas

use crate::error::{Result, SheetsError};
use crate::types::{BatchUpdate, BatchUpdateResponse};
use reqwest::{Client as HttpClient, Response};
use serde_json::Value;
use std::time::Duration;

/// Cliente para interagir com o serviço de sincronização
///
/// Endpoints usados:
/// - `POST /v1/spreadsheets/{id}/values:batchUpdate` — grava um lote de células
/// - `GET  /v1/ping` — teste de conectividade
#[derive(Clone)]
pub struct SheetsClient {
    http_client: HttpClient,
    api_token: String,
    base_url: String,
}

impl SheetsClient {
    /// Cria um novo cliente de sincronização
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(api_token, base_url, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        api_token: impl Into<String>,
        base_url: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| SheetsError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        Ok(Self {
            http_client,
            api_token: api_token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Envia um lote de alterações de células
    ///
    /// O lote inteiro é aceito ou rejeitado; o serviço não grava parcialmente.
    pub async fn batch_update(&self, batch: &BatchUpdate) -> Result<BatchUpdateResponse> {
        if batch.is_empty() {
            return Err(SheetsError::ValidationError(
                "Batch update sem alterações".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/spreadsheets/{}/values:batchUpdate",
            self.base_url, batch.spreadsheet_id
        );

        tracing::debug!("POST {} ({} células)", url, batch.len());

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(batch)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let parsed = response.json().await?;
        Ok(parsed)
    }

    /// Teste de conectividade com o serviço de sincronização
    pub async fn test_connection(&self) -> Result<()> {
        let url = format!("{}/v1/ping", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await?;

        self.handle_response(response).await.map(|_| ())
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Sheets sync API error ({}): {}", status_code, error_body);

            // Tentar extrair mensagem de erro do JSON
            let message = if let Ok(json) = serde_json::from_str::<Value>(&error_body) {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(&error_body)
                    .to_string()
            } else {
                error_body
            };

            Err(SheetsError::ApiError {
                status: status_code,
                message,
            })
        }
    }

    /// Obtém a URL base configurada
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
