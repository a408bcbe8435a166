use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use abmix_planilha_middleware::services::CellState;
use abmix_planilha_middleware::utils::logging::*;
use abmix_planilha_middleware::utils::AppError;
use abmix_planilha_middleware::AppState;

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub row: String,
    pub column: String,
    pub value: String,
}

/// Aplica uma edição de célula na sessão
///
/// Edição em célula não editável (ou inexistente) é no-op silencioso, como
/// no editor original: a resposta indica `applied: false` mas o status é 200.
pub async fn apply_edit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EditRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/planilha/edits", "POST");

    if payload.row.is_empty() || payload.column.is_empty() {
        return Err(AppError::ValidationError(
            "row e column são obrigatórios".to_string(),
        ));
    }

    let mut sessao = state.edicoes.write().await;
    sessao.edit(
        &payload.row,
        &payload.column,
        &payload.value,
        chrono::Utc::now(),
    );

    let applied = sessao
        .cell(&payload.row, &payload.column)
        .map(|c| c.state() != CellState::Clean && c.value == payload.value)
        .unwrap_or(false);

    Ok(Json(json!({
        "applied": applied,
        "row": payload.row,
        "column": payload.column,
        "pendentes": sessao.dirty_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Pendências da sessão de edição
pub async fn get_pendencias(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessao = state.edicoes.read().await;

    Json(json!({
        "dirty": sessao.dirty_count(),
        "saving": sessao.saving_count(),
        "flush_em_voo": sessao.is_flush_in_flight(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
