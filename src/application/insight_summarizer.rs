// Insight summarizer - Ranked observations over aggregate statistics
use crate::application::energy_repository::EnergyRepository;
use crate::application::prompts::{extract_json_array, insight_prompt};
use crate::application::text_completion::{CompletionRequest, TextCompletion};
use crate::domain::insight::{Insight, InsightKind};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct InsightSummarizer {
    completion: Arc<dyn TextCompletion>,
    repository: Arc<dyn EnergyRepository>,
}

impl InsightSummarizer {
    pub fn new(completion: Arc<dyn TextCompletion>, repository: Arc<dyn EnergyRepository>) -> Self {
        Self {
            completion,
            repository,
        }
    }

    /// Never empty. Callers sort by descending priority for display.
    pub async fn summarize(&self) -> Vec<Insight> {
        if !self.completion.enabled() {
            return fallback_insights();
        }

        match self.generate().await {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(error = %e, "Insight generation failed; using canned insights");
                fallback_insights()
            }
        }
    }

    async fn generate(&self) -> anyhow::Result<Vec<Insight>> {
        let (daily, total_today, average_voltage) = tokio::join!(
            self.repository.daily_energy_7_days(),
            self.repository.total_energy_today(),
            self.repository.average_voltage(),
        );

        // Missing statistics degrade the prompt rather than abort it
        let daily = daily.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch 7-day history for insights");
            Vec::new()
        });
        let total_today = total_today.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch today's total for insights");
            0.0
        });
        let average_voltage = average_voltage.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch average voltage for insights");
            0.0
        });

        let prompt = insight_prompt(total_today, average_voltage, &daily);
        let response = self.completion.complete(CompletionRequest::prompt(prompt)).await?;
        parse_insights(&response)
    }
}

pub fn parse_insights(response: &str) -> anyhow::Result<Vec<Insight>> {
    let json = extract_json_array(response).context("No JSON array in insight response")?;
    let insights: Vec<Insight> = serde_json::from_str(json).context("Failed to parse insights")?;
    if insights.is_empty() {
        anyhow::bail!("Insight response was an empty array");
    }
    Ok(insights)
}

/// Static, always-safe observations shown when no model output is available.
pub fn fallback_insights() -> Vec<Insight> {
    vec![
        Insight::new(
            "Strong Morning Performance",
            "Energy generation peaks between 8-10 AM. Consider optimizing sensor placement for morning foot traffic.",
            InsightKind::Positive,
            8,
        ),
        Insight::new(
            "Voltage Stability Good",
            "System voltage remains stable around 3.5V. No calibration needed.",
            InsightKind::Positive,
            5,
        ),
        Insight::new(
            "Weekend Drop Normal",
            "Energy generation drops 40% on weekends due to reduced foot traffic. This is expected behavior.",
            InsightKind::Neutral,
            3,
        ),
    ]
}
