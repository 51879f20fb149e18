// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::anomaly_monitor::{AnomalyMonitor, WindowSource};
use crate::application::chat_service::ChatAssistant;
use crate::application::energy_repository::EnergyRepository;
use crate::application::forecast_engine::ForecastEngine;
use crate::application::insight_summarizer::InsightSummarizer;
use crate::application::session_manager::SessionManager;
use crate::application::text_completion::TextCompletion;
use crate::infrastructure::config::{load_pipeline_config, AnomalyWindow};
use crate::infrastructure::file_intent_store::FileIntentStore;
use crate::infrastructure::gemini_client::GeminiCompletion;
use crate::infrastructure::http_energy_repository::HttpEnergyRepository;
use crate::infrastructure::sse_feed::SseTelemetryFeed;
use crate::presentation::app_state::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_pipeline_config()?;

    // Create adapters (infrastructure layer)
    let http = reqwest::Client::new();
    let feed = Arc::new(SseTelemetryFeed::new(http.clone(), config.feed.stream_url()));
    let intent = Arc::new(FileIntentStore::new(config.intent.path.clone()));
    let repository: Arc<dyn EnergyRepository> =
        Arc::new(HttpEnergyRepository::new(http, &config.feed.base_url));
    let completion: Arc<dyn TextCompletion> = Arc::new(GeminiCompletion::new(config.ai.clone())?);

    // Create services (application layer)
    let session = SessionManager::new(feed, intent, config.buffer.capacity);
    let source = match config.anomaly.window {
        AnomalyWindow::Stream => WindowSource::Stream(session.clone()),
        AnomalyWindow::History => WindowSource::History(repository.clone()),
    };
    let monitor = AnomalyMonitor::new(source);

    session.resume_from_intent();
    let _monitor_handle = monitor.spawn(config.anomaly.interval());

    let state = Arc::new(AppState {
        session,
        monitor,
        forecast: ForecastEngine::new(completion.clone(), repository.clone()),
        insights: InsightSummarizer::new(completion.clone(), repository.clone()),
        chat: ChatAssistant::new(completion, repository),
    });

    // Build router (presentation layer)
    let router = presentation::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address {}", config.server.bind))?;
    tracing::info!(%addr, ai_enabled = config.ai.is_enabled(), "Starting piezo-telemetry service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
