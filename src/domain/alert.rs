// Anomaly alert domain model
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Ordered: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Which signal triggered an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Voltage,
    Energy,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyAlert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub metric: Metric,
    pub value: f64,
    pub expected: f64,
}

impl AnomalyAlert {
    pub fn new(
        timestamp: DateTime<Utc>,
        severity: Severity,
        metric: Metric,
        message: &str,
        value: f64,
        expected: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            severity,
            message: message.to_string(),
            metric,
            value,
            expected,
        }
    }
}
