use crate::domain::ring_buffer::DEFAULT_CAPACITY;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder shipped in sample env files; treated the same as no key.
const PLACEHOLDER_API_KEY: &str = "your_google_gemini_api_key_here";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub intent: IntentSettings,
    #[serde(default)]
    pub anomaly: AnomalySettings,
    #[serde(default)]
    pub ai: AiSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    /// Base URL of the telemetry API, shared with the aggregate endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntentSettings {
    #[serde(default = "default_intent_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyWindow {
    #[default]
    Stream,
    History,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnomalySettings {
    #[serde(default = "default_anomaly_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub window: AnomalyWindow,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_stream_path() -> String {
    "/api/data/stream/raw".to_string()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_intent_path() -> PathBuf {
    PathBuf::from("state/streaming.toml")
}

fn default_anomaly_interval() -> u64 {
    300
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    64
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_ai_timeout() -> u64 {
    30
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
        }
    }
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for IntentSettings {
    fn default() -> Self {
        Self {
            path: default_intent_path(),
        }
    }
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            interval_secs: default_anomaly_interval(),
            window: AnomalyWindow::default(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_ai_endpoint(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl FeedSettings {
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.stream_path)
    }
}

impl AnomalySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AiSettings {
    /// The capability is on only with a real key configured.
    pub fn is_enabled(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load `config/pipeline.toml` (optional) overlaid with `PIEZO__*` environment variables.
pub fn load_pipeline_config() -> anyhow::Result<PipelineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/pipeline").required(false))
        .add_source(
            config::Environment::with_prefix("PIEZO")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: PipelineConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &PipelineConfig) -> anyhow::Result<()> {
    if config.buffer.capacity == 0 {
        anyhow::bail!("buffer.capacity must be at least 1");
    }
    if config.anomaly.interval_secs == 0 {
        anyhow::bail!("anomaly.interval_secs must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> PipelineConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = from_toml("");
        assert_eq!(config.buffer.capacity, 20);
        assert_eq!(config.anomaly.interval(), Duration::from_secs(300));
        assert_eq!(config.anomaly.window, AnomalyWindow::Stream);
        assert_eq!(config.feed.stream_url(), "http://localhost:5000/api/data/stream/raw");
        assert!(!config.ai.is_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = from_toml(
            r#"
            [feed]
            base_url = "http://sensor.local:5000/"

            [buffer]
            capacity = 50

            [anomaly]
            window = "history"

            [ai]
            api_key = "abc123"
            "#,
        );
        assert_eq!(config.feed.stream_url(), "http://sensor.local:5000/api/data/stream/raw");
        assert_eq!(config.buffer.capacity, 50);
        assert_eq!(config.anomaly.window, AnomalyWindow::History);
        assert!(config.ai.is_enabled());
        assert_eq!(config.ai.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_placeholder_key_is_disabled() {
        let ai = AiSettings {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            ..AiSettings::default()
        };
        assert!(!ai.is_enabled());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = PipelineConfig::default();
        config.buffer.capacity = 0;
        assert!(validate(&config).is_err());
        assert!(validate(&PipelineConfig::default()).is_ok());
    }
}
