//! Settings for the application, read from `settings.toml`.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
}

/// Background maintenance. Every interval falls back to a sensible
/// default when left out of the settings file.
#[derive(Debug, Deserialize)]
pub struct Jobs {
    pub database: Database,
    pub recurring_interval_secs: Option<u64>,
    pub maintenance_interval_secs: Option<u64>,
    pub prune_interval_secs: Option<u64>,
    pub retry_window_secs: Option<u64>,
    pub stuck_after_secs: Option<u64>,
    pub log_retention_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub jobs: Option<Jobs>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
