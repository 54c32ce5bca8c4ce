use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::context::{ContextAdapter, NoopContextAdapter, apply_ansible_context, clean_ansible_output, outline_from_content};
use crate::http_error::{RawHttpError, handle_http_error};
use crate::providers::traits::{
    ChatRequestParams, ChatResponseParams, CompletionRequestParams, CompletionResponseParams,
    DEFAULT_CONVERSATION_ID, DEFAULT_TIMEOUT_MS, GenerationKind, GenerationRequestParams,
    GenerationResponseParams, LlmProvider, ModelInfo, ProviderConfig, ProviderError,
    ProviderStatus, default_capabilities,
};

const PROVIDER_NAME: &str = "WCA";
const DEFAULT_MODEL: &str = "wca-codegen-1";
const API_VERSION: &str = "v1";

const CODEGEN_PATH: &str = "/v1/wca/codegen/ansible";
const CHAT_PATH: &str = "/v1/wca/chat";

/// Backend for the vendor "WCA" code-assistant service. Unlike Gemini the
/// endpoint is part of the credential set: both the API key and the endpoint
/// must be configured.
pub struct WcaProvider {
    config: ProviderConfig,
    timeout: Duration,
    adapter: Arc<dyn ContextAdapter>,
    client: reqwest::Client,
}

impl WcaProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_timeout(config, DEFAULT_TIMEOUT_MS)
    }

    pub fn with_timeout(config: ProviderConfig, timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms.unwrap_or(timeout_ms));
        Self {
            config,
            timeout,
            adapter: Arc::new(NoopContextAdapter),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ContextAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    fn model(&self) -> &str {
        self.config.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::Config("WCA API key is not configured".to_string()))
    }

    fn api_endpoint(&self) -> Result<&str, ProviderError> {
        self.config
            .api_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| ProviderError::Config("WCA API endpoint is not configured".to_string()))
    }

    #[instrument(skip(self, prompt))]
    async fn dispatch_codegen(
        &self,
        prompt: &str,
        operation: &str,
    ) -> Result<WcaCodegenResponse, ProviderError> {
        let url = format!("{}{}", self.api_endpoint()?, CODEGEN_PATH);
        let request_body = WcaCodegenRequest {
            model_id: self.model(),
            prompt,
        };

        debug!("dispatching WCA codegen request for {}", operation);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("error sending request to WCA: {}", e);
                handle_http_error(RawHttpError::from(&e), operation, PROVIDER_NAME)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP error from WCA: {}", status);
            return Err(handle_http_error(
                RawHttpError::from_status(status, body),
                operation,
                PROVIDER_NAME,
            ));
        }

        let parsed: WcaCodegenResponse = response.json().await.map_err(|e| {
            error!("error parsing WCA response: {}", e);
            handle_http_error(RawHttpError::from_message(e.to_string()), operation, PROVIDER_NAME)
        })?;

        if parsed.predictions.is_empty() {
            error!("empty prediction list from WCA");
            return Err(handle_http_error(
                RawHttpError::from_message("empty prediction list"),
                operation,
                PROVIDER_NAME,
            ));
        }

        Ok(parsed)
    }

    async fn generate(
        &self,
        params: &GenerationRequestParams,
        kind: GenerationKind,
    ) -> Result<GenerationResponseParams, ProviderError> {
        let enhanced =
            apply_ansible_context(self.adapter.as_ref(), &params.prompt, params.metadata.as_ref());

        let prompt = match params.supplied_outline() {
            Some(outline) => format!(
                "Generate an Ansible {} for: {}\nFollow this outline:\n{}",
                kind.as_str(),
                enhanced,
                outline
            ),
            None => format!("Generate an Ansible {} for: {}", kind.as_str(), enhanced),
        };

        let parsed = self.dispatch_codegen(&prompt, kind.operation()).await?;
        let model = parsed.model_label(self.model());
        let content = clean_ansible_output(parsed.primary_prediction());

        let outline = match params.supplied_outline() {
            Some(outline) => outline.to_string(),
            None => outline_from_content(&content, &params.prompt),
        };

        Ok(GenerationResponseParams {
            content,
            outline,
            model,
        })
    }
}

// === Request Structs ===
#[derive(Serialize)]
struct WcaCodegenRequest<'a> {
    model_id: &'a str,
    prompt: &'a str,
}

#[derive(Serialize)]
struct WcaChatRequest<'a> {
    model_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
}

// === Response Structs ===
#[derive(Deserialize)]
struct WcaCodegenResponse {
    predictions: Vec<String>,
    model_id: Option<String>,
}

impl WcaCodegenResponse {
    fn primary_prediction(&self) -> &str {
        self.predictions.first().map(String::as_str).unwrap_or_default()
    }

    fn model_label(&self, fallback: &str) -> String {
        self.model_id
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Deserialize)]
struct WcaChatResponse {
    message: String,
    conversation_id: Option<String>,
    model_id: Option<String>,
}

#[async_trait]
impl LlmProvider for WcaProvider {
    fn validate_config(&self) -> bool {
        self.api_key().is_ok() && self.api_endpoint().is_ok()
    }

    async fn get_status(&self) -> ProviderStatus {
        if self.api_key().is_err() {
            return ProviderStatus::disconnected("WCA API key is not configured");
        }
        if self.api_endpoint().is_err() {
            return ProviderStatus::disconnected("WCA API endpoint is not configured");
        }
        ProviderStatus::connected(ModelInfo {
            name: self.model().to_string(),
            version: API_VERSION.to_string(),
            capabilities: default_capabilities(),
        })
    }

    async fn completion_request(
        &self,
        params: CompletionRequestParams,
    ) -> Result<CompletionResponseParams, ProviderError> {
        let parsed = self.dispatch_codegen(&params.prompt, "completion").await?;

        let suggestion_id = params
            .suggestion_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(CompletionResponseParams {
            predictions: parsed.predictions,
            suggestion_id,
        })
    }

    #[instrument(skip(self, params))]
    async fn chat_request(
        &self,
        params: ChatRequestParams,
    ) -> Result<ChatResponseParams, ProviderError> {
        let operation = "chat";
        let url = format!("{}{}", self.api_endpoint()?, CHAT_PATH);
        let request_body = WcaChatRequest {
            model_id: self.model(),
            message: &params.query,
            conversation_id: params.conversation_id.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("error sending chat request to WCA: {}", e);
                handle_http_error(RawHttpError::from(&e), operation, PROVIDER_NAME)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP error from WCA chat: {}", status);
            return Err(handle_http_error(
                RawHttpError::from_status(status, body),
                operation,
                PROVIDER_NAME,
            ));
        }

        let parsed: WcaChatResponse = response.json().await.map_err(|e| {
            error!("error parsing WCA chat response: {}", e);
            handle_http_error(RawHttpError::from_message(e.to_string()), operation, PROVIDER_NAME)
        })?;

        let model = parsed
            .model_id
            .unwrap_or_else(|| self.model().to_string());

        Ok(ChatResponseParams {
            message: parsed.message,
            conversation_id: parsed
                .conversation_id
                .or(params.conversation_id)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSATION_ID.to_string()),
            model,
        })
    }

    async fn generate_playbook(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError> {
        self.generate(&params, GenerationKind::Playbook).await
    }

    async fn generate_role(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError> {
        self.generate(&params, GenerationKind::Role).await
    }
}
