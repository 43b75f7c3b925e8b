//! Service Configuration
//!
//! Layered settings: `config/default.toml` when present, then `FDP_`
//! environment overrides (`FDP_SERVER__PORT=9090`). Every field has a
//! default so the binary runs with no config file at all.
//!
//! Detection thresholds and training constants are deliberately NOT
//! configurable; they are fixed domain constants of the diagnosers.

use alerting::AlertConfig;
use serde::Deserialize;

/// Top-level service settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub model: ModelSettings,
    pub alerts: AlertConfig,
    pub rate_limit: RateLimitSettings,
}

/// Bind address for the HTTP server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// SQLite connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://fault_diagnosis.db".to_string(),
        }
    }
}

/// Where the persisted scaler and forest blobs live
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub dir: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: "model".to_string(),
        }
    }
}

/// GCRA rate limit applied to the diagnose routes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Replenish interval in seconds
    pub per_second: u64,
    /// Requests allowed in a burst
    pub burst_size: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

impl Settings {
    /// Load settings from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("FDP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
