/// Main Application: middleware de planilha do Abmix
///
/// Arquitetura:
/// - Cache de propostas atualizado por polling (30s) e por webhook do backend
/// - Projeção dinâmica achata as propostas em tabela larga (uma linha por proposta)
/// - Export CSV com marcador [vazio] e escaping RFC 4180
/// - Sessão de edição com debounce de 2s; lotes enviados ao serviço de
///   sincronização de planilha (crate local sheets/)

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Importar módulos da biblioteca
use abmix_planilha_middleware::config::Settings;
use abmix_planilha_middleware::utils::logging::*;
use abmix_planilha_middleware::{services, AppState};

mod handlers;

use handlers::{
    apply_edit, export_planilha, get_pendencias, get_planilha, handle_propostas_webhook,
    health_check, ready_check, status_check,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar .env se existir
    if dotenvy::dotenv().is_err() {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt::init();

    // Carregar configurações
    let settings = Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;

    log_config_loaded(&std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()));

    // Cliente do serviço de sincronização de planilha
    let sheets_client = sheets::SheetsClient::new(
        settings.sheets.api_token.clone(),
        settings.sheets.base_url.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create sheets client: {}", e))?;

    // Cache de propostas com polling (última resposta vence)
    let propostas = services::ProposalCache::new(
        settings.backend.base_url.clone(),
        settings.backend.api_token.clone(),
        settings.backend.refresh_interval_seconds,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create proposal cache: {}", e))?;

    // Primeiro snapshot: falha não derruba o serviço, o polling tenta de novo
    match propostas.refresh().await {
        Ok(total) => log_info(&format!("✅ Snapshot inicial: {} propostas", total)),
        Err(e) => log_warning(&format!(
            "⚠️ Snapshot inicial indisponível ({}); aguardando próximo polling",
            e
        )),
    }
    propostas.start().await;

    // Sessão de edição compartilhada + scheduler de sincronização
    let edicoes = Arc::new(RwLock::new(services::EditSession::new(
        settings.planilha.debounce_ms,
    )));
    let sync_scheduler = services::SheetSyncScheduler::new(
        edicoes.clone(),
        sheets_client.clone(),
        settings.sheets.spreadsheet_id.clone(),
        settings.planilha.flush_tick_ms,
    );
    sync_scheduler.start().await;
    log_info("✅ Scheduler de sincronização de edições iniciado");

    // Inicializar estado da aplicação
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        sheets: sheets_client,
        propostas,
        edicoes,
    });

    // Configurar rotas
    let app = Router::new()
        // Health checks (públicos)
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))

        // Planilha projetada
        .route("/api/planilha", get(get_planilha))
        .route("/api/planilha/export", get(export_planilha))
        .route("/api/planilha/edits", post(apply_edit))
        .route("/api/planilha/pendencias", get(get_pendencias))

        // Webhook do backend (público - validação própria por assinatura)
        .route("/webhooks/propostas", post(handle_propostas_webhook))

        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Iniciar servidor (no Cloud Run, usar a variável de ambiente PORT)
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("failed to install Ctrl+C handler: {}", e));
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sinal) => {
                sinal.recv().await;
            }
            Err(e) => log_error(&format!("failed to install signal handler: {}", e)),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
