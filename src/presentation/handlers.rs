// HTTP request handlers
use crate::application::session_manager::SessionSnapshot;
use crate::application::text_completion::ChatTurn;
use crate::domain::alert::AnomalyAlert;
use crate::domain::forecast::ForecastPoint;
use crate::domain::insight::{sort_by_priority, Insight};
use crate::domain::telemetry::Sample;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

const DEFAULT_FORECAST_HOURS: usize = 24;
const MAX_FORECAST_HOURS: usize = 168;

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub hours: Option<usize>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn stream_status(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

/// Latest accepted sample, `null` before the first one arrives
pub async fn current_reading(State(state): State<Arc<AppState>>) -> Json<Option<Sample>> {
    Json(state.session.current_reading())
}

pub async fn start_stream(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    tracing::info!(state = ?state.session.state(), "Stream start requested");
    state.session.start();
    Json(state.session.snapshot())
}

pub async fn pause_stream(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    tracing::info!(state = ?state.session.state(), "Stream pause requested");
    state.session.pause();
    Json(state.session.snapshot())
}

pub async fn stop_stream(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    tracing::info!(state = ?state.session.state(), "Stream stop requested");
    state.session.stop();
    Json(state.session.snapshot())
}

/// Push every session change to the client as a JSON snapshot.
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = WatchStream::new(state.session.subscribe())
        .map(|snapshot| Event::default().event("snapshot").json_data(&snapshot));

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AnomalyAlert>> {
    Json(state.monitor.alerts())
}

pub async fn check_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AnomalyAlert>> {
    Json(state.monitor.check_now().await)
}

pub async fn dismiss_alert(Path(id): Path<Uuid>, State(state): State<Arc<AppState>>) -> StatusCode {
    if state.monitor.dismiss(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn forecast(
    Query(query): Query<ForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ForecastPoint>> {
    let hours = query
        .hours
        .unwrap_or(DEFAULT_FORECAST_HOURS)
        .min(MAX_FORECAST_HOURS);

    Json(state.forecast.forecast(hours).await)
}

pub async fn insights(State(state): State<Arc<AppState>>) -> Json<Vec<Insight>> {
    Json(sort_by_priority(state.insights.summarize().await))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state.chat.ask(&request.message, &request.history).await;
    Json(ChatResponse { reply })
}
