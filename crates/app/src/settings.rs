//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `BOOKING__*` environment
//! variables (e.g. `BOOKING__SERVER__PORT=8080`).
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use engine::PostingPoint;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub posting_point: PostingPoint,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Option<Server>,
    #[serde(default)]
    pub ledger: Ledger,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("BOOKING")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
