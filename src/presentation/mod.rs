// Presentation layer - HTTP surface
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chat, check_alerts, current_reading, dismiss_alert, forecast, health_check, insights, list_alerts,
    pause_stream, start_stream, stop_stream, stream_events, stream_status,
};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/stream", get(stream_status))
        .route("/stream/current", get(current_reading))
        .route("/stream/start", post(start_stream))
        .route("/stream/pause", post(pause_stream))
        .route("/stream/stop", post(stop_stream))
        .route("/stream/events", get(stream_events))
        .route("/alerts", get(list_alerts))
        .route("/alerts/check", post(check_alerts))
        .route("/alerts/:id", delete(dismiss_alert))
        .route("/forecast", get(forecast))
        .route("/insights", get(insights))
        .route("/chat", post(chat))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::anomaly_monitor::{AnomalyMonitor, WindowSource};
    use crate::application::chat_service::{ChatAssistant, DISABLED_REPLY};
    use crate::application::energy_repository::EnergyRepository;
    use crate::application::forecast_engine::ForecastEngine;
    use crate::application::insight_summarizer::InsightSummarizer;
    use crate::application::intent_store::IntentStore;
    use crate::application::session_manager::SessionManager;
    use crate::application::telemetry_feed::{FrameStream, TelemetryFeed};
    use crate::application::text_completion::{CompletionRequest, TextCompletion};
    use crate::domain::errors::{CompletionError, FeedError};
    use crate::domain::telemetry::{DailyEnergy, EnergyBucket};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Accepts the subscription but never delivers a frame.
    struct SilentFeed;

    #[async_trait]
    impl TelemetryFeed for SilentFeed {
        async fn subscribe(&self) -> Result<FrameStream, FeedError> {
            Ok(Box::pin(futures::stream::pending()))
        }
    }

    #[derive(Default)]
    struct MemoryIntent(AtomicBool);

    impl IntentStore for MemoryIntent {
        fn read_intent(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }

        fn write_intent(&self, streaming: bool) {
            self.0.store(streaming, Ordering::SeqCst);
        }
    }

    struct Disabled;

    #[async_trait]
    impl TextCompletion for Disabled {
        fn enabled(&self) -> bool {
            false
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::Disabled)
        }
    }

    struct EmptyRepository;

    #[async_trait]
    impl EnergyRepository for EmptyRepository {
        async fn total_energy_today(&self) -> anyhow::Result<f64> {
            Ok(0.0)
        }

        async fn average_voltage(&self) -> anyhow::Result<f64> {
            Ok(0.0)
        }

        async fn daily_energy_7_days(&self) -> anyhow::Result<Vec<DailyEnergy>> {
            Ok(Vec::new())
        }

        async fn energy_generation_24h(&self) -> anyhow::Result<Vec<EnergyBucket>> {
            Ok(Vec::new())
        }
    }

    async fn spawn_app() -> String {
        let completion: Arc<dyn TextCompletion> = Arc::new(Disabled);
        let repository: Arc<dyn EnergyRepository> = Arc::new(EmptyRepository);
        let session = SessionManager::new(Arc::new(SilentFeed), Arc::new(MemoryIntent::default()), 20);

        let state = Arc::new(AppState {
            monitor: AnomalyMonitor::new(WindowSource::Stream(session.clone())),
            session,
            forecast: ForecastEngine::new(completion.clone(), repository.clone()),
            insights: InsightSummarizer::new(completion.clone(), repository.clone()),
            chat: ChatAssistant::new(completion, repository),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health_check() {
        let base = spawn_app().await;
        let body = reqwest::get(format!("{}/healthz", base)).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_stream_lifecycle() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let idle: Value = client.get(format!("{}/stream", base)).send().await.unwrap().json().await.unwrap();
        assert_eq!(idle["state"], "idle");
        assert_eq!(idle["samples"], json!([]));

        let current: Value = client
            .get(format!("{}/stream/current", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(current.is_null());

        let started: Value = client
            .post(format!("{}/stream/start", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(started["state"], "connecting");

        let stopped: Value = client
            .post(format!("{}/stream/stop", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stopped["state"], "idle");
    }

    #[tokio::test]
    async fn test_forecast_horizon_is_capped() {
        let base = spawn_app().await;

        let points: Vec<Value> = reqwest::get(format!("{}/forecast?hours=500", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(points.len(), 168);

        let points: Vec<Value> = reqwest::get(format!("{}/forecast", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(points.len(), 24);
        assert_eq!(points[0]["confidence"], 0.7);
    }

    #[tokio::test]
    async fn test_insights_sorted_by_priority() {
        let base = spawn_app().await;
        let insights: Vec<Value> = reqwest::get(format!("{}/insights", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let priorities: Vec<i64> = insights.iter().map(|i| i["priority"].as_i64().unwrap()).collect();
        assert_eq!(priorities, vec![8, 5, 3]);
    }

    #[tokio::test]
    async fn test_chat_when_disabled() {
        let base = spawn_app().await;
        let reply: Value = reqwest::Client::new()
            .post(format!("{}/chat", base))
            .json(&json!({ "message": "How much energy today?" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reply["reply"], DISABLED_REPLY);
    }

    #[tokio::test]
    async fn test_dismiss_unknown_alert() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        // An empty window produces no alerts
        let alerts: Vec<Value> = client
            .post(format!("{}/alerts/check", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(alerts.is_empty());

        let status = client
            .delete(format!("{}/alerts/{}", base, uuid::Uuid::new_v4()))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    }
}
