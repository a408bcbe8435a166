use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use abmix_planilha_middleware::utils::logging::*;
use abmix_planilha_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "abmix-planilha-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    log_integration_status_check();

    // Testa a conexão com o serviço de sincronização
    let sheets_status = match state.sheets.test_connection().await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let cache_populado = state.propostas.last_refresh().await.is_some();
    let overall_ready = sheets_status == "connected";

    let response = json!({
        "ready": overall_ready,
        "service": "abmix-planilha-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "sheets": {
                "status": sheets_status,
                "spreadsheet_id": state.settings.sheets.spreadsheet_id
            },
            "backend": {
                "base_url": state.settings.backend.base_url,
                "cache_populated": cache_populado
            }
        }
    });

    if overall_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_integration_status_check();

    let total_propostas = state.propostas.len().await;
    let ultimo_refresh = state
        .propostas
        .last_refresh()
        .await
        .map(|t| t.to_rfc3339());

    let (dirty, saving, em_voo) = {
        let sessao = state.edicoes.read().await;
        (
            sessao.dirty_count(),
            sessao.saving_count(),
            sessao.is_flush_in_flight(),
        )
    };

    Json(json!({
        "service": "abmix-planilha-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        "propostas": {
            "total_em_cache": total_propostas,
            "ultimo_refresh": ultimo_refresh,
            "intervalo_polling_segundos": state.settings.backend.refresh_interval_seconds
        },
        "edicoes": {
            "dirty": dirty,
            "saving": saving,
            "flush_em_voo": em_voo,
            "debounce_ms": state.settings.planilha.debounce_ms
        },
        "integrations": {
            "sheets": {
                "base_url": state.sheets.base_url(),
                "spreadsheet_id": state.settings.sheets.spreadsheet_id
            },
            "backend": {
                "base_url": state.settings.backend.base_url,
                "webhook_secret_configured": state.settings.backend.webhook_secret.is_some()
            }
        }
    }))
}
