// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_intent_store;
pub mod gemini_client;
pub mod http_energy_repository;
pub mod sse_codec;
pub mod sse_feed;
