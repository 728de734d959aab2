//! Application settings, read from `settings.toml` with environment
//! overrides. Secrets (the JWT signing key in particular) are expected to
//! come from the environment in deployments, e.g. `SPESA__AUTH__JWT__SECRET`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use service::TokenConfig;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the workspace crates (trace, debug, info, warn, error).
    pub level: String,
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
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt: TokenConfig,
    pub max_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .add_source(Environment::with_prefix("SPESA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
