use config::ConfigError;
use domain::Platform;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "REQQUEUE_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub admin_token: String,
}

#[derive(Deserialize, Clone, Default)]
pub struct OutputSettings {
    // rewritten on every queue change, for OBS text sources
    pub todo_xml_path: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct SourceSettings {
    pub stream_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_platform")]
    pub platform: Platform,
    pub path: String,
    #[serde(default)]
    pub follow: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_platform() -> Platform {
    Platform::YouTube
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/reqqueue.db")?
            .set_default("security.admin_token", "admin_secret_123")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .map_err(|e| ConfigError::Message(e.to_string()))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
