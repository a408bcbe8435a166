//! Tipos de erro para o crate sheets

use thiserror::Error;

/// Erros do cliente de sincronização de planilha
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API de sincronização (status code não-200)
    #[error("Sheets sync API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Erro de validação (lote vazio, célula sem coluna, etc)
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, SheetsError>;
