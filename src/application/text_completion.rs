// Port for the generative text-completion capability
use crate::domain::errors::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Earlier turns of a conversation, oldest first
    pub history: Vec<ChatTurn>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            prompt: prompt.into(),
        }
    }
}

/// Unreliable by contract: every caller must have a fallback.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    fn enabled(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
