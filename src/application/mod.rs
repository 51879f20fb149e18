// Application layer - Pipeline services and the ports they depend on
pub mod anomaly_detector;
pub mod anomaly_monitor;
pub mod chat_service;
pub mod energy_repository;
pub mod forecast_engine;
pub mod insight_summarizer;
pub mod intent_store;
pub mod prompts;
pub mod session_manager;
pub mod telemetry_feed;
pub mod text_completion;
