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

const PROVIDER_NAME: &str = "Gemini";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_VERSION: &str = "v1beta";

const GENERATION_SYSTEM_INSTRUCTION: &str =
    "You are an Ansible expert. Respond with only the requested YAML content.";
const CHAT_SYSTEM_INSTRUCTION: &str =
    "You are an Ansible expert assisting with playbook and role authoring.";

pub struct GeminiProvider {
    config: ProviderConfig,
    timeout: Duration,
    adapter: Arc<dyn ContextAdapter>,
    client: reqwest::Client,
}

impl GeminiProvider {
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

    fn endpoint(&self) -> &str {
        self.config.api_endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn model(&self) -> &str {
        self.config.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::Config("Gemini API key is not configured".to_string()))
    }

    /// Sends one `generateContent` call and returns the parsed envelope. Every
    /// failure mode (send, non-success status, body parse, empty candidate
    /// list) is funneled through the HTTP error classifier.
    #[instrument(skip(self, prompt, system_instruction))]
    async fn dispatch(
        &self,
        prompt: &str,
        system_instruction: &str,
        operation: &str,
    ) -> Result<GeminiResponse, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint(),
            self.model(),
            self.api_key()?
        );

        let request_body = GeminiRequest {
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction,
                }],
            },
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };

        debug!("dispatching Gemini request for {}", operation);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("error sending request to Gemini: {}", e);
                handle_http_error(RawHttpError::from(&e), operation, PROVIDER_NAME)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP error from Gemini: {}", status);
            return Err(handle_http_error(
                RawHttpError::from_status(status, body),
                operation,
                PROVIDER_NAME,
            ));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            error!("error parsing Gemini response: {}", e);
            handle_http_error(RawHttpError::from_message(e.to_string()), operation, PROVIDER_NAME)
        })?;

        if parsed.candidates.is_empty() {
            error!("empty candidate list from Gemini");
            return Err(handle_http_error(
                RawHttpError::from_message("empty candidate list"),
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

        let parsed = self
            .dispatch(&prompt, GENERATION_SYSTEM_INSTRUCTION, kind.operation())
            .await?;
        let model = parsed.model_label(self.model());
        let content = clean_ansible_output(&parsed.primary_text());

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
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
}

// === Response Structs ===
#[derive(Deserialize)]
struct TextPartOwned {
    text: String,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<TextPartOwned>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

impl GeminiResponse {
    fn primary_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default()
    }

    fn all_texts(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .collect()
    }

    fn model_label(&self, fallback: &str) -> String {
        self.model_version
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn validate_config(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn get_status(&self) -> ProviderStatus {
        if !self.validate_config() {
            return ProviderStatus::disconnected("Gemini API key is not configured");
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
        let parsed = self
            .dispatch(&params.prompt, GENERATION_SYSTEM_INSTRUCTION, "completion")
            .await?;

        let suggestion_id = params
            .suggestion_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(CompletionResponseParams {
            predictions: parsed.all_texts(),
            suggestion_id,
        })
    }

    async fn chat_request(
        &self,
        params: ChatRequestParams,
    ) -> Result<ChatResponseParams, ProviderError> {
        let parsed = self
            .dispatch(&params.query, CHAT_SYSTEM_INSTRUCTION, "chat")
            .await?;
        let model = parsed.model_label(self.model());

        Ok(ChatResponseParams {
            message: parsed.primary_text(),
            conversation_id: params
                .conversation_id
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
