//! Lote de alterações de células enviado ao serviço de sincronização

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uma alteração de célula: linha (id da proposta), coluna e novo valor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub row: String,
    pub column: String,
    pub value: String,
}

impl CellChange {
    pub fn new(
        row: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Lote de alterações pendentes, enviado como uma única requisição
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdate {
    /// Id do lote, gerado localmente (auditoria/idempotência no serviço)
    pub batch_id: Uuid,
    /// Planilha de destino
    pub spreadsheet_id: String,
    pub changes: Vec<CellChange>,
    pub sent_at: DateTime<Utc>,
}

impl BatchUpdate {
    pub fn new(spreadsheet_id: impl Into<String>, changes: Vec<CellChange>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            spreadsheet_id: spreadsheet_id.into(),
            changes,
            sent_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Resposta do serviço de sincronização para um lote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdateResponse {
    pub batch_id: Uuid,
    /// Quantidade de células efetivamente gravadas
    pub updated: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}
