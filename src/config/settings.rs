use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub sheets: SheetsSettings,
    pub planilha: PlanilhaSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Backend Abmix (dono do store de propostas)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    /// Intervalo do polling de propostas (o legado usa 30s)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub validate_signature: bool,
}

/// Serviço de sincronização de planilha
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SheetsSettings {
    pub api_token: String,
    pub base_url: String,
    pub spreadsheet_id: String,
}

/// Parâmetros da projeção e da sessão de edição
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlanilhaSettings {
    /// Teto de titulares/dependentes enumerados por proposta
    #[serde(default = "default_max_pessoas")]
    pub max_pessoas: usize,
    /// Janela de debounce do auto-save (o legado usa 2000ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Intervalo do scheduler que verifica edições pendentes
    #[serde(default = "default_flush_tick_ms")]
    pub flush_tick_ms: u64,
    /// Colunas que aceitam edição pela planilha
    #[serde(default)]
    pub colunas_editaveis: Vec<String>,
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_max_pessoas() -> usize {
    99
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_flush_tick_ms() -> u64 {
    500
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Adicionar variáveis de ambiente específicas
        if let Ok(token) = std::env::var("SHEETS_API_TOKEN") {
            builder = builder.set_override("sheets.api_token", token)?;
        }
        if let Ok(spreadsheet_id) = std::env::var("SHEETS_SPREADSHEET_ID") {
            builder = builder.set_override("sheets.spreadsheet_id", spreadsheet_id)?;
        }
        if let Ok(base_url) = std::env::var("ABMIX_BACKEND_URL") {
            builder = builder.set_override("backend.base_url", base_url)?;
        }

        // Prefixo genérico para os demais overrides
        builder = builder.add_source(Environment::with_prefix("ABMIX_PLANILHA"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}
