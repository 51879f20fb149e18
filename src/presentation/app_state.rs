// Application state for HTTP handlers
use crate::application::anomaly_monitor::AnomalyMonitor;
use crate::application::chat_service::ChatAssistant;
use crate::application::forecast_engine::ForecastEngine;
use crate::application::insight_summarizer::InsightSummarizer;
use crate::application::session_manager::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionManager,
    pub monitor: AnomalyMonitor,
    pub forecast: ForecastEngine,
    pub insights: InsightSummarizer,
    pub chat: ChatAssistant,
}
