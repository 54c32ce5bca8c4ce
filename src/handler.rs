//! Webview message routing: one generation request in, one result message out.
//!
//! The handler bridges a UI-originated `{ text, outline }` event to the active
//! provider and reports back through a [`MessageSink`]. Side effects are
//! strictly ordered: history and telemetry run only after a confirmed success,
//! a failure short-circuits both.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::providers::traits::{
    GenerationKind, GenerationRequestParams, GenerationResponseParams, LlmProvider, ProviderError,
};

/// Fixed banner prefixed to every classified message shown to the UI.
pub const SERVER_ERROR_BANNER: &str = "Failed to get an answer from the server: ";

/// Inbound UI event requesting one generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequestMessage {
    pub text: String,
    #[serde(default)]
    pub outline: Option<String>,
}

/// Outbound webview channel message, JSON-shaped as `{ "type": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OutboundMessage {
    GeneratePlaybook(GenerationResponseParams),
    ErrorMessage(String),
}

pub trait MessageSink: Send + Sync {
    fn post(&self, message: OutboundMessage);
}

pub trait PromptHistory: Send + Sync {
    fn append(&self, prompt: &str);
}

pub trait ContentMatchTelemetry: Send + Sync {
    fn content_match(&self, request_id: &str, content: &str);
}

/// Sink that buffers posted messages so a caller can drain them afterwards.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub posted: Mutex<Vec<OutboundMessage>>,
}

impl BufferSink {
    pub fn drain(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.posted.lock().unwrap())
    }
}

impl MessageSink for BufferSink {
    fn post(&self, message: OutboundMessage) {
        self.posted.lock().unwrap().push(message);
    }
}

/// Prompt history owned by the extension host; here an in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    pub prompts: Mutex<Vec<String>>,
}

impl PromptHistory for InMemoryHistory {
    fn append(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
    }
}

/// Content-match telemetry reported as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl ContentMatchTelemetry for TracingTelemetry {
    fn content_match(&self, request_id: &str, content: &str) {
        debug!(request_id, content_len = content.len(), "content match");
    }
}

/// Generation entry point consumed by the handler: wraps one provider call
/// under the request id's span.
#[instrument(skip(client, prompt, outline), fields(request_id = %request_id))]
pub async fn generate_playbook(
    client: &dyn LlmProvider,
    prompt: &str,
    outline: Option<&str>,
    request_id: &str,
) -> Result<GenerationResponseParams, ProviderError> {
    debug!("dispatching playbook generation request");
    let params = GenerationRequestParams {
        prompt: prompt.to_string(),
        kind: GenerationKind::Playbook,
        outline: outline.map(str::to_string),
        metadata: None,
    };
    client.generate_playbook(params).await
}

pub struct WebviewMessageHandler<S, H, T> {
    provider: Arc<dyn LlmProvider>,
    sink: Arc<S>,
    history: Arc<H>,
    telemetry: Arc<T>,
}

impl<S, H, T> WebviewMessageHandler<S, H, T>
where
    S: MessageSink,
    H: PromptHistory,
    T: ContentMatchTelemetry,
{
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sink: Arc<S>,
        history: Arc<H>,
        telemetry: Arc<T>,
    ) -> Self {
        Self {
            provider,
            sink,
            history,
            telemetry,
        }
    }

    /// Routes one generation request to the provider and posts the outcome.
    #[instrument(skip(self, message))]
    pub async fn handle_generate(&self, message: GenerateRequestMessage) {
        let request_id = Uuid::new_v4().to_string();

        match generate_playbook(
            self.provider.as_ref(),
            &message.text,
            message.outline.as_deref(),
            &request_id,
        )
        .await
        {
            Ok(result) => {
                let content = result.content.clone();
                self.sink.post(OutboundMessage::GeneratePlaybook(result));
                self.telemetry.content_match(&request_id, &content);
                self.history.append(&message.text);
            }
            Err(err) => {
                error!("generation failed: {}", err);
                self.sink
                    .post(OutboundMessage::ErrorMessage(format!(
                        "{}{}",
                        SERVER_ERROR_BANNER, err
                    )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    /// Records sink/history/telemetry calls in one shared event log so
    /// ordering can be asserted.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        posted: Mutex<Vec<OutboundMessage>>,
    }

    impl MessageSink for Recorder {
        fn post(&self, message: OutboundMessage) {
            self.events.lock().unwrap().push("post".to_string());
            self.posted.lock().unwrap().push(message);
        }
    }

    impl PromptHistory for Recorder {
        fn append(&self, prompt: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("append {}", prompt));
        }
    }

    impl ContentMatchTelemetry for Recorder {
        fn content_match(&self, _request_id: &str, _content: &str) {
            self.events.lock().unwrap().push("content_match".to_string());
        }
    }

    fn handler_with(
        provider: MockProvider,
        recorder: Arc<Recorder>,
    ) -> WebviewMessageHandler<Recorder, Recorder, Recorder> {
        WebviewMessageHandler::new(
            Arc::new(provider),
            recorder.clone(),
            recorder.clone(),
            recorder,
        )
    }

    #[tokio::test]
    async fn success_posts_once_then_telemetry_then_history() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler_with(MockProvider::new(), recorder.clone());

        handler
            .handle_generate(GenerateRequestMessage {
                text: "install nginx".to_string(),
                outline: None,
            })
            .await;

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "post".to_string(),
                "content_match".to_string(),
                "append install nginx".to_string(),
            ]
        );

        let posted = recorder.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        match &posted[0] {
            OutboundMessage::GeneratePlaybook(result) => {
                assert!(!result.content.is_empty());
                assert!(!result.outline.is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn failure_posts_one_error_and_skips_history_and_telemetry() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler_with(MockProvider::failing("vendor exploded"), recorder.clone());

        handler
            .handle_generate(GenerateRequestMessage {
                text: "install nginx".to_string(),
                outline: None,
            })
            .await;

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(events, vec!["post".to_string()]);

        let posted = recorder.posted.lock().unwrap();
        assert_eq!(
            posted[0],
            OutboundMessage::ErrorMessage(
                "Failed to get an answer from the server: vendor exploded".to_string()
            )
        );
    }

    #[tokio::test]
    async fn supplied_outline_travels_through_the_entry_point() {
        let provider = MockProvider::new();
        let result = generate_playbook(&provider, "install nginx", Some("1. step"), "req-1")
            .await
            .unwrap();
        assert_eq!(result.outline, "1. step");
    }

    #[test]
    fn outbound_messages_serialize_with_type_and_data_tags() {
        let error = OutboundMessage::ErrorMessage("boom".to_string());
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["type"], "errorMessage");
        assert_eq!(value["data"], "boom");

        let success = OutboundMessage::GeneratePlaybook(GenerationResponseParams {
            content: "---".to_string(),
            outline: "1. x".to_string(),
            model: "m".to_string(),
        });
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(value["type"], "generatePlaybook");
        assert_eq!(value["data"]["content"], "---");
    }
}
