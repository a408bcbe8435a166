use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use abmix_planilha_middleware::services::{csv_export, projector};
use abmix_planilha_middleware::utils::logging::*;
use abmix_planilha_middleware::utils::AppError;
use abmix_planilha_middleware::AppState;

/// Projeta o snapshot corrente de propostas como tabela larga
///
/// A sessão de edição é recarregada a partir da tabela nova; células com
/// edição pendente não são sobrescritas pelo snapshot.
pub async fn get_planilha(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    log_request_received("/api/planilha", "GET");

    let registros = state.propostas.snapshot().await;
    let tabela = projector::project_with_cap(&registros, state.settings.planilha.max_pessoas);
    log_projecao_concluida(tabela.rows.len(), tabela.columns.len());

    {
        let mut sessao = state.edicoes.write().await;
        sessao.load_table(&tabela, &state.settings.planilha.colunas_editaveis);
    }

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/api/planilha", 200, processing_time);

    Ok(Json(json!({
        "columns": tabela.columns,
        "rows": tabela.rows,
        "total": tabela.rows.len(),
        "ultimo_refresh": state.propostas.last_refresh().await.map(|t| t.to_rfc3339()),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Exporta a projeção corrente como CSV para download
pub async fn export_planilha(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let start_time = Instant::now();
    log_request_received("/api/planilha/export", "GET");

    let registros = state.propostas.snapshot().await;
    let tabela = projector::project_with_cap(&registros, state.settings.planilha.max_pessoas);
    let csv = csv_export::export_csv(&tabela);
    log_csv_exportado(tabela.rows.len(), csv.len());

    let nome_arquivo = format!(
        "propostas_{}.csv",
        chrono::Utc::now().format("%Y-%m-%d_%H%M%S")
    );

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/api/planilha/export", 200, processing_time);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", nome_arquivo),
            ),
        ],
        csv,
    )
        .into_response())
}
