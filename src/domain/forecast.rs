// Energy forecast domain model
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted_energy: f64,
    pub confidence: f64,
}

impl ForecastPoint {
    /// Energy is floored at zero and confidence clamped into `0..=1`.
    pub fn new(timestamp: DateTime<Utc>, predicted_energy: f64, confidence: f64) -> Self {
        let predicted_energy = if predicted_energy.is_finite() {
            predicted_energy.max(0.0)
        } else {
            0.0
        };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            timestamp,
            predicted_energy,
            confidence,
        }
    }
}
