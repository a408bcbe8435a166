// Biblioteca do middleware Abmix-Planilha
// Expõe módulos para uso em testes e binários

use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub sheets: sheets::SheetsClient,
    pub propostas: services::ProposalCache,
    pub edicoes: Arc<RwLock<services::EditSession>>,
}
