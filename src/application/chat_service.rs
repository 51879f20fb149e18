// Chat assistant - Conversational questions about energy data
use crate::application::energy_repository::EnergyRepository;
use crate::application::prompts::chat_context;
use crate::application::text_completion::{ChatTurn, CompletionRequest, TextCompletion};
use crate::domain::errors::CompletionError;
use std::sync::Arc;

pub const DISABLED_REPLY: &str =
    "AI features are currently disabled. Please configure your Gemini API key in the environment variables.";

#[derive(Clone)]
pub struct ChatAssistant {
    completion: Arc<dyn TextCompletion>,
    repository: Arc<dyn EnergyRepository>,
}

impl ChatAssistant {
    pub fn new(completion: Arc<dyn TextCompletion>, repository: Arc<dyn EnergyRepository>) -> Self {
        Self {
            completion,
            repository,
        }
    }

    /// Always returns displayable text; failures become an apology.
    pub async fn ask(&self, message: &str, history: &[ChatTurn]) -> String {
        if !self.completion.enabled() {
            return DISABLED_REPLY.to_string();
        }

        // System context only accompanies the opening question
        let prompt = if history.is_empty() {
            format!("{}\n\nUser question: {}", self.context().await, message)
        } else {
            message.to_string()
        };

        let request = CompletionRequest {
            history: history.to_vec(),
            prompt,
        };

        match self.completion.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Chat completion failed");
                apology(&e)
            }
        }
    }

    async fn context(&self) -> String {
        let (last_24h, total_today, average_voltage) = tokio::join!(
            self.repository.energy_generation_24h(),
            self.repository.total_energy_today(),
            self.repository.average_voltage(),
        );

        chat_context(
            total_today.unwrap_or_default(),
            average_voltage.unwrap_or_default(),
            &last_24h.unwrap_or_default(),
        )
    }
}

pub fn apology(error: &CompletionError) -> String {
    match error {
        CompletionError::Disabled => DISABLED_REPLY.to_string(),
        CompletionError::InvalidApiKey(_) => {
            "Invalid API key. Please check your Gemini API key configuration.".to_string()
        }
        CompletionError::QuotaExceeded(_) => "API quota exceeded. Please try again later.".to_string(),
        CompletionError::Blocked(_) => {
            "Content was blocked by safety filters. Please rephrase your question.".to_string()
        }
        other => format!("Error: {}. Please try again later.", other),
    }
}
