//! Classification of raw vendor/transport errors into stable, operation-scoped
//! messages. Pure functions of their inputs; nothing here performs I/O.

use reqwest::StatusCode;

use crate::providers::traits::ProviderError;

/// Display name used when a backend does not supply its own.
pub const DEFAULT_PROVIDER_NAME: &str = "Provider";

const UNKNOWN_MESSAGE: &str = "Unknown error";

/// A raw error as seen at the transport boundary. Both fields are optional:
/// a failed send usually carries no status, a non-success response carries
/// both a status and a body.
#[derive(Debug, Clone, Default)]
pub struct RawHttpError {
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl RawHttpError {
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status: Some(status.as_u16()),
            message: Some(body.into()),
        }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
        }
    }
}

impl From<&reqwest::Error> for RawHttpError {
    fn from(err: &reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: Some(err.to_string()),
        }
    }
}

/// Maps a raw error to one stable, operation-scoped message. Always returns a
/// constructed error value; never panics and never rethrows the input.
pub fn handle_http_error(
    error: RawHttpError,
    operation: &str,
    provider_name: &str,
) -> ProviderError {
    let msg = error
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());

    let text = match error.status {
        Some(400) => format!("Bad request during {}: {}", operation, msg),
        Some(403) => format!(
            "Forbidden (403) during {}: check your API key - {}",
            operation, msg
        ),
        Some(429) => format!("Rate limit exceeded (429) during {}: {}", operation, msg),
        Some(500) => format!(
            "{} returned an unexpected error during {}: {}",
            provider_name, operation, msg
        ),
        Some(503) => format!(
            "Service unavailable (503) from {} during {}: {}",
            provider_name, operation, msg
        ),
        Some(504) => format!("Gateway timeout (504) during {}: {}", operation, msg),
        Some(status) => format!(
            "{} error ({}) during {}: {}",
            provider_name, status, operation, msg
        ),
        None => format!(
            "{} error during {}: {} (status: N/A)",
            provider_name, operation, msg
        ),
    };

    ProviderError::Http(text)
}
