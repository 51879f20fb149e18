// Gemini generateContent adapter for the text-completion port
use crate::application::text_completion::{ChatRole, CompletionRequest, TextCompletion};
use crate::domain::errors::CompletionError;
use crate::infrastructure::config::AiSettings;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiCompletion {
    client: reqwest::Client,
    settings: AiSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiCompletion {
    pub fn new(settings: AiSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to build Gemini HTTP client")?;

        if !settings.is_enabled() {
            tracing::warn!("Gemini API key not configured. AI features will be disabled.");
        }

        Ok(Self { client, settings })
    }

    // The key travels in a header only; reqwest errors render the full URL.
    fn build_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            urlencoding::encode(self.settings.model.trim())
        )
    }

    fn build_body<'a>(&self, request: &'a CompletionRequest) -> GenerateContentRequest<'a> {
        let mut contents: Vec<Content<'a>> = request
            .history
            .iter()
            .map(|turn| Content {
                role: match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: [TextPart { text: &turn.content }],
            })
            .collect();
        contents.push(Content {
            role: "user",
            parts: [TextPart { text: &request.prompt }],
        });

        GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                top_k: self.settings.top_k,
                max_output_tokens: self.settings.max_output_tokens,
            },
        }
    }
}

fn transport_error(error: reqwest::Error) -> CompletionError {
    CompletionError::Transport(error.without_url().to_string())
}

fn classify_status(status: u16, body: String) -> CompletionError {
    let mentions_key = body.contains("API key") || body.contains("API_KEY");
    match status {
        429 => CompletionError::QuotaExceeded(body),
        400 | 401 | 403 if mentions_key => CompletionError::InvalidApiKey(body),
        _ => CompletionError::Upstream { status, body },
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, CompletionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CompletionError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(CompletionError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some("SAFETY") => Err(CompletionError::Blocked("SAFETY".to_string())),
            _ => Err(CompletionError::EmptyResponse),
        };
    }
    Ok(text)
}

#[async_trait]
impl TextCompletion for GeminiCompletion {
    fn enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        if !self.enabled() {
            return Err(CompletionError::Disabled);
        }

        tracing::debug!(
            model = %self.settings.model,
            turns = request.history.len(),
            "Requesting text completion"
        );

        let response = self
            .client
            .post(self.build_url())
            .header(API_KEY_HEADER, self.settings.api_key.trim())
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(transport_error)?;

        extract_text(parsed)
    }
}
