//! Cliente local do serviço de sincronização de planilhas do Abmix
//!
//! Este crate fornece uma interface tipo-segura para o colaborador externo que
//! persiste as edições de células na planilha (Google Sheets, via serviço de
//! sincronização próprio):
//!
//! - Envio de lotes de alterações de células (`batch_update`)
//! - Teste de conectividade (`test_connection`)
//! - Tipos do payload de lote (`BatchUpdate`, `CellChange`)
//!
//! O middleware nunca fala com a API do Google diretamente; toda persistência
//! passa pelo serviço de sincronização, que é dono do formato de planilha.
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use sheets::{SheetsClient, BatchUpdate, CellChange};
//!
//! #[tokio::main]
//! async fn main() -> sheets::Result<()> {
//!     // IMPORTANTE: Ler de variáveis de ambiente (NUNCA hardcode!)
//!     let api_token = std::env::var("SHEETS_API_TOKEN")
//!         .expect("SHEETS_API_TOKEN não configurado");
//!
//!     let client = SheetsClient::new(api_token, "https://sync.abmix.app")?;
//!
//!     let lote = BatchUpdate::new("planilha-propostas", vec![
//!         CellChange::new("PROP-1", "EMPRESA", "Acme Ltda"),
//!     ]);
//!     client.batch_update(&lote).await?;
//!
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod client;
pub mod error;
pub mod types;

// Re-exports principais
pub use client::SheetsClient;
pub use error::{Result, SheetsError};
pub use types::{BatchUpdate, BatchUpdateResponse, CellChange};
