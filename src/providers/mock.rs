use async_trait::async_trait;
use uuid::Uuid;

use crate::context::{clean_ansible_output, outline_from_content};
use crate::providers::traits::{
    ChatRequestParams, ChatResponseParams, CompletionRequestParams, CompletionResponseParams,
    DEFAULT_CONVERSATION_ID, GenerationKind, GenerationRequestParams, GenerationResponseParams,
    LlmProvider, ModelInfo, ProviderError, ProviderStatus, default_capabilities,
};

const MODEL_NAME: &str = "mock-model";

/// Deterministic in-process backend. Answers every request with canned
/// content; [`MockProvider::failing`] makes every request fail with the given
/// classified message instead.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    fail_with: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
        }
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        match &self.fail_with {
            Some(message) => Err(ProviderError::Http(message.clone())),
            None => Ok(()),
        }
    }

    fn canned_content(kind: GenerationKind, prompt: &str) -> String {
        // Fenced like real vendor output so the shared cleanup path runs.
        let raw = format!(
            "```yaml\n---\n- name: Mock {} for {}\n  hosts: all\n  tasks:\n    - name: Report the request\n      ansible.builtin.debug:\n        msg: {}\n```",
            kind.as_str(),
            prompt,
            prompt
        );
        clean_ansible_output(&raw)
    }

    fn generate(
        &self,
        params: &GenerationRequestParams,
        kind: GenerationKind,
    ) -> Result<GenerationResponseParams, ProviderError> {
        self.check_failure()?;
        let content = Self::canned_content(kind, &params.prompt);
        let outline = match params.supplied_outline() {
            Some(outline) => outline.to_string(),
            None => outline_from_content(&content, &params.prompt),
        };
        Ok(GenerationResponseParams {
            content,
            outline,
            model: MODEL_NAME.to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn validate_config(&self) -> bool {
        true
    }

    async fn get_status(&self) -> ProviderStatus {
        ProviderStatus::connected(ModelInfo {
            name: MODEL_NAME.to_string(),
            version: "0".to_string(),
            capabilities: default_capabilities(),
        })
    }

    async fn completion_request(
        &self,
        params: CompletionRequestParams,
    ) -> Result<CompletionResponseParams, ProviderError> {
        self.check_failure()?;
        Ok(CompletionResponseParams {
            predictions: vec![format!("Mock completion for: {}", params.prompt)],
            suggestion_id: params
                .suggestion_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }

    async fn chat_request(
        &self,
        params: ChatRequestParams,
    ) -> Result<ChatResponseParams, ProviderError> {
        self.check_failure()?;
        Ok(ChatResponseParams {
            message: format!("Mock answer for: {}", params.query),
            conversation_id: params
                .conversation_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSATION_ID.to_string()),
            model: MODEL_NAME.to_string(),
        })
    }

    async fn generate_playbook(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError> {
        self.generate(&params, GenerationKind::Playbook)
    }

    async fn generate_role(
        &self,
        params: GenerationRequestParams,
    ) -> Result<GenerationResponseParams, ProviderError> {
        self.generate(&params, GenerationKind::Role)
    }
}
