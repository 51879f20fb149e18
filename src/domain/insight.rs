// Insight domain model
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Neutral,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Higher is more important.
    pub priority: i32,
}

impl Insight {
    pub fn new(title: &str, description: &str, kind: InsightKind, priority: i32) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            kind,
            priority,
        }
    }
}

/// Display order: descending priority, stable for ties.
pub fn sort_by_priority(mut insights: Vec<Insight>) -> Vec<Insight> {
    insights.sort_by(|a, b| b.priority.cmp(&a.priority));
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_type_field() {
        let json = r#"{"title":"Peak","description":"Busy morning","type":"warning","priority":7}"#;
        let insight: Insight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.kind, InsightKind::Warning);
        assert_eq!(insight.priority, 7);
    }

    #[test]
    fn test_sort_by_priority_descending() {
        let sorted = sort_by_priority(vec![
            Insight::new("a", "", InsightKind::Neutral, 3),
            Insight::new("b", "", InsightKind::Positive, 8),
            Insight::new("c", "", InsightKind::Warning, 5),
        ]);
        let titles: Vec<&str> = sorted.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }
}
