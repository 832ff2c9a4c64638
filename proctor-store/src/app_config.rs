use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Without a database the service runs on an in-memory roster seeded
    /// from `seating.layout_path`.
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub seating: SeatingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeatingConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_row_width")]
    pub row_width: usize,
    #[serde(default = "default_chunk_size")]
    pub notify_chunk_size: usize,
    #[serde(default = "default_topic")]
    pub topic: String,
    pub layout_path: Option<String>,
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            row_width: default_row_width(),
            notify_chunk_size: default_chunk_size(),
            topic: default_topic(),
            layout_path: None,
        }
    }
}

fn default_strategy() -> String { "least_exposure".to_string() }
fn default_row_width() -> usize { 6 }
fn default_chunk_size() -> usize { proctor_core::notifier::DEFAULT_CHUNK_SIZE }
fn default_topic() -> String { proctor_shared::models::events::SEAT_ASSIGNED_TOPIC.to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layers `{dir}/default`, `{dir}/{RUN_MODE}`, `{dir}/local` and the
    /// `PROCTOR__*` environment, later sources winning.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            .add_source(config::Environment::with_prefix("PROCTOR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
