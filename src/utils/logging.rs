use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_projecao_concluida(linhas: usize, colunas: usize) {
    info!("📊 Projeção concluída: {} linhas x {} colunas", linhas, colunas);
}

pub fn log_csv_exportado(linhas: usize, bytes: usize) {
    info!("📄 CSV exportado: {} linhas ({} bytes)", linhas, bytes);
}

pub fn log_propostas_atualizadas(total: usize) {
    info!("🔄 Cache de propostas atualizado: {} registros", total);
}

pub fn log_refresh_falhou(error: &str) {
    error!("❌ Falha ao atualizar cache de propostas: {}", error);
}

pub fn log_flush_enviado(celulas: usize) {
    info!("✅ Lote de edições sincronizado: {} células", celulas);
}

pub fn log_flush_falhou(error: &str) {
    warn!("⚠️ Falha ao sincronizar lote (edições continuam pendentes): {}", error);
}

pub fn log_edicao_ignorada(row: &str, column: &str) {
    debug!("Edição ignorada (célula não editável ou inexistente): {} / {}", row, column);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Abmix planilha middleware server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_integration_status_check() {
    debug!("Integration status check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
