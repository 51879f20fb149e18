// Port for the server-push telemetry feed
use crate::domain::errors::FeedError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Raw text payloads, one per feed event. The stream ends or yields an
/// error when the subscription fails.
pub type FrameStream = BoxStream<'static, Result<String, FeedError>>;

#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    /// Open one subscription to the feed
    async fn subscribe(&self) -> Result<FrameStream, FeedError>;
}
