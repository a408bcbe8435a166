//! Cache de propostas com refresh por polling
//!
//! O backend Abmix é dono do store de propostas; este middleware mantém um
//! snapshot em memória, atualizado por polling (o legado usa 30s) e pelo
//! webhook de mudanças. Última resposta de rede vence: um refresh disparado
//! depois sobrescreve o snapshot inteiro.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::interval;

use crate::models::ProposalRecord;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ProposalCache {
    registros: Arc<RwLock<Vec<ProposalRecord>>>,
    atualizado_em: Arc<RwLock<Option<DateTime<Utc>>>>,
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    /// Intervalo do polling em segundos
    refresh_interval: u64,
    running: Arc<RwLock<bool>>,
}

impl ProposalCache {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        refresh_interval_seconds: u64,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        Ok(Self {
            registros: Arc::new(RwLock::new(Vec::new())),
            atualizado_em: Arc::new(RwLock::new(None)),
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            refresh_interval: refresh_interval_seconds,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Busca as propostas no backend e substitui o snapshot
    pub async fn refresh(&self) -> AppResult<usize> {
        let url = format!("{}/api/proposals", self.base_url);

        let mut request = self.http_client.get(&url);
        if let Some(ref token) = self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::BackendApi(format!(
                "GET /api/proposals retornou {}: {}",
                status.as_u16(),
                body
            )));
        }

        // Formatos estranhos não derrubam o refresh: campos ausentes viram
        // default e campos extras vão para os mapas dinâmicos
        let propostas: Vec<ProposalRecord> = response.json().await?;
        let total = propostas.len();

        *self.registros.write().await = propostas;
        *self.atualizado_em.write().await = Some(Utc::now());

        log_propostas_atualizadas(total);
        Ok(total)
    }

    /// Snapshot corrente (clonado; a projeção só lê)
    pub async fn snapshot(&self) -> Vec<ProposalRecord> {
        self.registros.read().await.clone()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.atualizado_em.read().await
    }

    pub async fn len(&self) -> usize {
        self.registros.read().await.len()
    }

    /// Inicia o polling periódico (similar ao scheduler do legado)
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            log_warning("Polling de propostas já está rodando");
            return;
        }
        *running = true;
        drop(running);

        let cache = self.clone();

        tokio::spawn(async move {
            let mut intervalo = interval(Duration::from_secs(cache.refresh_interval));
            log_info(&format!(
                "Polling de propostas iniciado (intervalo: {}s)",
                cache.refresh_interval
            ));

            loop {
                intervalo.tick().await;

                let running = cache.running.read().await;
                if !*running {
                    break;
                }
                drop(running);

                if let Err(e) = cache.refresh().await {
                    log_refresh_falhou(&e.to_string());
                }
            }

            log_info("Polling de propostas encerrado");
        });
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }
}
