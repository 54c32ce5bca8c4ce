use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeout applied to every outbound vendor call unless overridden at
/// construction time.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Sentinel conversation id used when the caller starts a chat without one.
pub const DEFAULT_CONVERSATION_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    Http(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Connection settings a backend owns for its lifetime. Immutable after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub model_name: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub capabilities: BTreeSet<String>,
}

/// Computed on demand by [`LlmProvider::get_status`], never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

impl ProviderStatus {
    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
            model_info: None,
        }
    }

    pub fn connected(model_info: ModelInfo) -> Self {
        Self {
            connected: true,
            error: None,
            model_info: Some(model_info),
        }
    }
}

pub fn default_capabilities() -> BTreeSet<String> {
    ["completion", "chat", "playbook", "role"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequestParams {
    pub prompt: String,
    pub suggestion_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponseParams {
    pub predictions: Vec<String>,
    pub suggestion_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequestParams {
    pub query: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResponseParams {
    pub message: String,
    pub conversation_id: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Playbook,
    Role,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Playbook => "playbook",
            GenerationKind::Role => "role",
        }
    }

    /// Operation label used in classified error messages and spans.
    pub fn operation(&self) -> &'static str {
        match self {
            GenerationKind::Playbook => "playbook generation",
            GenerationKind::Role => "role generation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestParams {
    pub prompt: String,
    pub kind: GenerationKind,
    pub outline: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl GenerationRequestParams {
    pub fn new(prompt: impl Into<String>, kind: GenerationKind) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            outline: None,
            metadata: None,
        }
    }

    /// A caller-supplied outline counts only when it has visible content;
    /// the original string is echoed verbatim in the response.
    pub fn supplied_outline(&self) -> Option<&str> {
        match self.outline.as_deref() {
            Some(outline) if !outline.trim().is_empty() => Some(outline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponseParams {
    pub content: String,
    pub outline: String,
    pub model: String,
}

/// Capability set every backend implements so the rest of the system stays
/// backend-agnostic.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Whether the required credentials/settings are present. Pure function
    /// of the stored config; never fails.
    fn validate_config(&self) -> bool;

    /// Runs validation and, if valid, reports model metadata. Invalid config
    /// yields `connected = false` and a non-empty error.
    async fn get_status(&self) -> ProviderStatus;

    async fn completion_request(
        &self,
        params: CompletionRequestParams,
    ) -> Result<CompletionResponseParams, ProviderError>;

    async fn chat_request(
        &self,
        params: ChatRequestParams,
    ) -> Result<ChatResponseParams, ProviderError>;

    async fn generate_playbook(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError>;

    async fn generate_role(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError>;
}
