//! Configuration loading for Regimyx.
//! Reads regimyx.toml from the current directory or path in REGIMYX_CONFIG env var.

use regimyx_common::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "regimyx=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}


impl Config {
    /// Path of the config file: REGIMYX_CONFIG, else ./regimyx.toml.
    pub fn path() -> String {
        std::env::var("REGIMYX_CONFIG").unwrap_or_else(|_| "regimyx.toml".to_string())
    }

    /// Load configuration from regimyx.toml.
    /// Checks REGIMYX_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::path();

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy regimyx.example.toml to regimyx.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }
}
