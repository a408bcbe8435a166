use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use abmix_planilha_middleware::utils::logging::*;
use abmix_planilha_middleware::utils::{AppError, AppResult};
use abmix_planilha_middleware::AppState;

/// Webhook do backend Abmix: "propostas mudaram"
///
/// Responde Success imediatamente e dispara o refresh do cache em background;
/// o corpo do evento é informativo (o refresh sempre rebusca tudo).
pub async fn handle_propostas_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request<Body>,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    log_request_received("/webhooks/propostas", "POST");

    // Extrair o body da request
    let body_bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read request body: {}", e)))?;

    // Verificar assinatura do webhook (se configurado)
    if state.settings.backend.validate_signature {
        if let Some(ref secret) = state.settings.backend.webhook_secret {
            verify_webhook_signature(&headers, &body_bytes, secret)?;
        }
    }

    // O payload é best-effort: só para log do tipo de evento
    if let Ok(payload) = serde_json::from_slice::<Value>(&body_bytes) {
        let evento = payload
            .get("evento")
            .and_then(|v| v.as_str())
            .unwrap_or("desconhecido");
        log_info(&format!("📥 Evento de propostas recebido: {}", evento));
    }

    // Refresh em background (não bloqueia a resposta)
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = state_clone.propostas.refresh().await {
            log_error(&format!("Background refresh error: {}", e));
        }
    });

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/webhooks/propostas", 200, processing_time);

    Ok(Json(json!({
        "message": "Success"
    })))
}

fn verify_webhook_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> AppResult<()> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let signature_header = headers
        .get("X-Abmix-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::ValidationError("Missing X-Abmix-Signature header".to_string())
        })?;

    // Remove o prefixo "sha256=" se presente
    let signature = signature_header
        .strip_prefix("sha256=")
        .unwrap_or(signature_header);

    // Calcular HMAC
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::ValidationError(format!("Invalid secret key: {}", e)))?;

    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Comparação segura
    if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
        log_validation_error("webhook_signature", "Invalid signature");
        return Err(AppError::ValidationError(
            "Invalid webhook signature".to_string(),
        ));
    }

    Ok(())
}

// Comparação de tempo constante para evitar timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
