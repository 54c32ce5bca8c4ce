use std::sync::Arc;

use ansible_gen_service::{
    config::Config,
    handler::{
        BufferSink, GenerateRequestMessage, InMemoryHistory, OutboundMessage, TracingTelemetry,
        WebviewMessageHandler,
    },
    providers::{LlmProvider, factory::build_provider},
};
use axum::{Json, Router, routing::post};
use tracing::info;

async fn webview_handler(
    Json(message): Json<GenerateRequestMessage>,
    provider: Arc<dyn LlmProvider>,
    history: Arc<InMemoryHistory>,
    telemetry: Arc<TracingTelemetry>,
) -> Json<Vec<OutboundMessage>> {
    let sink = Arc::new(BufferSink::default());
    let handler = WebviewMessageHandler::new(provider, sink.clone(), history, telemetry);
    handler.handle_generate(message).await;
    Json(sink.drain())
}

async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let loaded_config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&loaded_config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("initialising {} provider", loaded_config.provider);
    let provider = build_provider(&loaded_config)?;
    let status = provider.get_status().await;
    if !status.connected {
        info!(
            "provider not connected: {}",
            status.error.unwrap_or_default()
        );
    }

    let history = Arc::new(InMemoryHistory::default());
    let telemetry = Arc::new(TracingTelemetry);

    let app = Router::new().route(
        "/webview",
        post({
            let provider = provider.clone();
            let history = history.clone();
            let telemetry = telemetry.clone();
            move |payload| webview_handler(payload, provider.clone(), history.clone(), telemetry.clone())
        }),
    );

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("server running on 0.0.0.0:3000");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");

    tracing::info!("Ctrl+C received, shutting down gracefully");
}

#[tokio::main]
async fn main() {
    if let Err(e) = init().await {
        eprintln!("application error: {}", e);
        std::process::exit(1);
    }
}
