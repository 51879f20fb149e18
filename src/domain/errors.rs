// Error taxonomy for the telemetry pipeline
use thiserror::Error;

/// A frame or model response that could not be decoded. Always recovered locally.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed frame JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Subscription-level failure. Fatal to the current session.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to connect to telemetry feed: {0}")]
    Connect(String),

    #[error("Telemetry feed returned status {0}")]
    Status(u16),

    #[error("Telemetry feed stream error: {0}")]
    Stream(String),

    #[error("Telemetry feed closed by server")]
    Closed,
}

/// Failure of the text-completion capability.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("AI features are disabled")]
    Disabled,

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Content blocked: {0}")]
    Blocked(String),

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Completion response contained no text")]
    EmptyResponse,
}
