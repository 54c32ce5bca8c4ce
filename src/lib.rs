//! Ansible playbook/role generation through pluggable LLM providers.
//!
//! The crate exposes a backend-agnostic provider contract
//! ([`providers::LlmProvider`]), an HTTP error classifier that turns raw
//! transport failures into stable user-facing messages, and a webview message
//! handler bridging one UI generation request to the active provider.

pub mod config;
pub mod context;
pub mod handler;
pub mod http_error;
pub mod providers;
