use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::providers::gemini::GeminiProvider;
use crate::providers::mock::MockProvider;
use crate::providers::traits::{LlmProvider, ProviderConfig};
use crate::providers::wca::WcaProvider;

/// Maps the configured provider name to a backend. Unknown names are a
/// configuration error, never a panic.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    let provider_config = ProviderConfig {
        api_key: Some(config.api_key.clone()),
        api_endpoint: config.api_endpoint.clone(),
        model_name: config.model_name.clone(),
        timeout_ms: config.timeout_ms,
    };

    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(provider_config))),
        "wca" => Ok(Arc::new(WcaProvider::new(provider_config))),
        "mock" => Ok(Arc::new(MockProvider::new())),
        other => Err(ConfigError::UnsupportedProvider(other.to_string())),
    }
}
