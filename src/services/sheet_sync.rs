//! Scheduler de sincronização das edições pendentes
//!
//! Loop de parede que alimenta a `EditSession` com o relógio real: a cada
//! tick pergunta à sessão se a janela de debounce fechou e, se houver lote,
//! envia em uma única requisição ao serviço de sincronização. Sucesso limpa
//! as células; falha devolve para Dirty e a próxima janela reenvia.
//!
//! A requisição de rede roda sem segurar o lock da sessão; novas edições
//! entram enquanto o lote está em voo e caem no lote seguinte.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::interval;

use crate::services::edit_session::EditSession;
use crate::utils::logging::*;
use sheets::{BatchUpdate, SheetsClient};

#[derive(Clone)]
pub struct SheetSyncScheduler {
    session: Arc<RwLock<EditSession>>,
    client: SheetsClient,
    spreadsheet_id: String,
    /// Intervalo entre verificações da janela de debounce
    tick_ms: u64,
    running: Arc<RwLock<bool>>,
}

impl SheetSyncScheduler {
    pub fn new(
        session: Arc<RwLock<EditSession>>,
        client: SheetsClient,
        spreadsheet_id: impl Into<String>,
        tick_ms: u64,
    ) -> Self {
        Self {
            session,
            client,
            spreadsheet_id: spreadsheet_id.into(),
            tick_ms,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Um ciclo de verificação: coleta e envia no máximo um lote
    pub async fn tick(&self) {
        let lote = {
            let mut sessao = self.session.write().await;
            sessao.take_batch(Utc::now())
        };

        let Some(mudancas) = lote else {
            return;
        };

        let total = mudancas.len();
        let lote = BatchUpdate::new(self.spreadsheet_id.clone(), mudancas);

        match self.client.batch_update(&lote).await {
            Ok(_) => {
                self.session.write().await.confirm_flush();
                log_flush_enviado(total);
            }
            Err(e) => {
                self.session.write().await.fail_flush();
                log_flush_falhou(&e.to_string());
            }
        }
    }

    /// Inicia o loop de verificação
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            log_warning("Scheduler de sincronização já está rodando");
            return;
        }
        *running = true;
        drop(running);

        let scheduler = self.clone();

        tokio::spawn(async move {
            let mut intervalo = interval(Duration::from_millis(scheduler.tick_ms));
            log_info("Scheduler de sincronização de edições iniciado");

            loop {
                intervalo.tick().await;

                let running = scheduler.running.read().await;
                if !*running {
                    break;
                }
                drop(running);

                scheduler.tick().await;
            }

            log_info("Scheduler de sincronização encerrado");
        });
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }
}
