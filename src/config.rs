use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::risk::UncertaintyConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub uncertainty: UncertaintyConfig,
    pub limits: LimitsConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            request_timeout_secs: 30,
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON model artifact. Unset means fallback scoring.
    pub artifact_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_batch_predictions: usize,
    pub max_batch_scenarios: usize,
    pub max_sensitivity_steps: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_predictions: 100,
            max_batch_scenarios: 20,
            max_sensitivity_steps: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: "info,hyper=warn,tower_http=info".into(),
        }
    }
}

impl Config {
    pub const ENV_PREFIX: &'static str = "ORF__";

    pub fn load() -> Result<Self> {
        Self::figment("config/default.toml")
            .extract()
            .context("Failed to load configuration")
    }

    /// Defaults, then the TOML file if present, then `ORF__SECTION__KEY`
    /// environment variables.
    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }
}
