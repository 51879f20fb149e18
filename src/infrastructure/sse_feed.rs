// Telemetry feed over HTTP server-sent events
use crate::application::telemetry_feed::{FrameStream, TelemetryFeed};
use crate::domain::errors::FeedError;
use crate::infrastructure::sse_codec::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;

#[derive(Debug, Clone)]
pub struct SseTelemetryFeed {
    client: reqwest::Client,
    url: String,
}

impl SseTelemetryFeed {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl TelemetryFeed for SseTelemetryFeed {
    async fn subscribe(&self) -> Result<FrameStream, FeedError> {
        tracing::info!(url = %self.url, "Connecting to telemetry feed");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let mut body = response.bytes_stream();
        let frames = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => match decoder.decode(&bytes) {
                        Ok(frames) => {
                            for frame in frames {
                                yield Ok(frame);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    },
                    Err(e) => {
                        yield Err(FeedError::Stream(e.to_string()));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(frames))
    }
}
