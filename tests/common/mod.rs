#![allow(dead_code)]

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};

pub const CANNED_PLAYBOOK: &str = "```yaml\n---\n- name: Install nginx\n  hosts: all\n  tasks:\n    - name: Install the nginx package\n      ansible.builtin.package:\n        name: nginx\n        state: present\n    - name: Start the nginx service\n      ansible.builtin.service:\n        name: nginx\n        state: started\n```";

pub const CANNED_ROLE: &str = "```yaml\n---\n- name: Ensure the webserver role is applied\n  ansible.builtin.include_role:\n    name: webserver\n```";

pub const CANNED_EXPLAIN: &str =
    "This playbook installs the nginx package and starts its service.";

pub const CANNED_OUTLINE: &str = "1. Install the nginx package\n2. Start the nginx service";

pub const CANNED_DEFAULT: &str = "---\n- name: Generated content\n  hosts: all";

pub fn setup_logger(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Selects the canned body the emulated vendor answers with, by inspecting
/// the request text case-insensitively. "outline" distinguishes
/// outline-generation from full-content requests.
fn canned_body(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("outline") {
        CANNED_OUTLINE
    } else if lower.contains("playbook") {
        CANNED_PLAYBOOK
    } else if lower.contains("role") {
        CANNED_ROLE
    } else if lower.contains("explain") {
        CANNED_EXPLAIN
    } else {
        CANNED_DEFAULT
    }
}

/// Pulls the user-authored text out of a Gemini `generateContent` payload,
/// ignoring the system instruction.
fn gemini_request_text(payload: &Value) -> String {
    let parts = payload
        .pointer("/contents/0/parts")
        .and_then(Value::as_array);
    parts
        .into_iter()
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn gemini_generate(Json(payload): Json<Value>) -> Json<Value> {
    let text = gemini_request_text(&payload);
    Json(json!({
        "candidates": [
            {
                "content": { "parts": [ { "text": canned_body(&text) } ] },
                "finishReason": "STOP"
            }
        ],
        "modelVersion": "mock-gemini-1"
    }))
}

async fn wca_codegen(Json(payload): Json<Value>) -> Json<Value> {
    let text = payload
        .get("prompt")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "predictions": [ canned_body(&text) ],
        "model_id": "mock-wca-1"
    }))
}

async fn wca_chat(Json(payload): Json<Value>) -> Json<Value> {
    let text = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "message": canned_body(&text),
        "conversation_id": payload.get("conversation_id").cloned().unwrap_or(Value::Null),
        "model_id": "mock-wca-1"
    }))
}

/// Spawns the mock vendor endpoint: always answers HTTP 200 with a fixed
/// envelope per vendor shape. Returns the base URL to use as the provider's
/// endpoint override.
pub async fn spawn_mock_vendor() -> String {
    let app = Router::new()
        .route("/models/:model_call", post(gemini_generate))
        .route("/v1/wca/codegen/ansible", post(wca_codegen))
        .route("/v1/wca/chat", post(wca_chat));

    spawn(app).await
}

/// Spawns a vendor that fails every request with the given status.
pub async fn spawn_error_vendor(status: u16) -> String {
    let status = StatusCode::from_u16(status).unwrap();
    let app = Router::new().fallback(move || async move { (status, "injected failure") });

    spawn(app).await
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
