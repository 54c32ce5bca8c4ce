use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("unsupported LLM provider: {0}")]
    UnsupportedProvider(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: String,
    pub api_key: String,
    pub api_endpoint: Option<String>,
    pub model_name: Option<String>,
    pub timeout_ms: Option<u64>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = require("AGS_PROVIDER")?;
        let api_key = require("AGS_API_KEY")?;
        let api_endpoint = env::var("AGS_API_ENDPOINT").ok();
        let model_name = env::var("AGS_MODEL_NAME").ok();

        let timeout_ms = match env::var("AGS_TIMEOUT_MS") {
            Ok(raw) => Some(raw.parse().map_err(|e| ConfigError::InvalidVar {
                var: "AGS_TIMEOUT_MS",
                reason: format!("{}", e),
            })?),
            Err(_) => None,
        };

        let log_level = env::var("AGS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            provider,
            api_key,
            api_endpoint,
            model_name,
            timeout_ms,
            log_level,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
