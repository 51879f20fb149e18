// Prompt construction and response extraction for the text-completion capability
use crate::domain::telemetry::{DailyEnergy, EnergyBucket};
use std::collections::HashMap;

const FORECAST_TEMPLATE: &str = r#"Based on this 7-day energy generation history for a piezoelectric energy harvesting system:
${history}

Analyze the pattern and predict energy generation for the next ${hours} hours in JSON format:
[{"hour": 0, "energy": 0.5, "confidence": 0.85}, ...]

Consider:
- Typical daily patterns (higher during work hours)
- Weekend vs weekday differences
- Recent trends

Respond ONLY with valid JSON array, no additional text."#;

const INSIGHT_TEMPLATE: &str = r#"Analyze this energy harvesting system data and provide 3-5 actionable insights in JSON format:

Today's Total: ${total_today} mWh
Average Voltage: ${average_voltage} V
7-day History: ${history}

Provide insights as JSON array:
[{
  "title": "Short insight title",
  "description": "Brief explanation and recommendation",
  "type": "positive" | "neutral" | "warning",
  "priority": 1-10
}, ...]

Focus on: performance trends, efficiency opportunities, unusual patterns, and actionable recommendations.
Respond ONLY with valid JSON array, no additional text."#;

const CHAT_CONTEXT_TEMPLATE: &str = r#"You are an AI assistant for a footstep energy harvesting system, which converts footsteps into electrical energy using piezoelectric sensors.

Current System Data:
- Total Energy Today: ${total_today} mWh
- Average Voltage: ${average_voltage} V
- 24h Energy Data Points: ${readings} readings
- Recent Energy: ${recent}

Your role is to help users understand their energy generation data, answer questions about system performance, and provide insights. Be concise and helpful."#;

/// Replace `${name}` placeholders in a template
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

/// The substring from the first `[` to the last `]`, if any.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

pub fn forecast_prompt(daily: &[DailyEnergy], hours: usize) -> String {
    let history = daily
        .iter()
        .map(|d| format!("{}: {} mWh", d.date, d.energy))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("history", history);
    vars.insert("hours", hours.to_string());
    render_template(FORECAST_TEMPLATE, &vars)
}

pub fn insight_prompt(total_today: f64, average_voltage: f64, daily: &[DailyEnergy]) -> String {
    let history = daily
        .iter()
        .map(|d| format!("{}: {}mWh", d.date, d.energy))
        .collect::<Vec<_>>()
        .join(", ");

    let mut vars = HashMap::new();
    vars.insert("total_today", total_today.to_string());
    vars.insert("average_voltage", average_voltage.to_string());
    vars.insert("history", history);
    render_template(INSIGHT_TEMPLATE, &vars)
}

pub fn chat_context(total_today: f64, average_voltage: f64, last_24h: &[EnergyBucket]) -> String {
    let recent = last_24h
        .iter()
        .skip(last_24h.len().saturating_sub(5))
        .map(|b| format!("{}mWh at {}:00", b.energy, b.hour))
        .collect::<Vec<_>>()
        .join(", ");

    let mut vars = HashMap::new();
    vars.insert("total_today", total_today.to_string());
    vars.insert("average_voltage", average_voltage.to_string());
    vars.insert("readings", last_24h.len().to_string());
    vars.insert("recent", recent);
    render_template(CHAT_CONTEXT_TEMPLATE, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("hours", "12".to_string());
        vars.insert("history", "2025-01-01: 4 mWh".to_string());

        let template = "History:\n${history}\nPredict ${hours}h as [{\"hour\": 0}]";
        let result = render_template(template, &vars);

        assert_eq!(result, "History:\n2025-01-01: 4 mWh\nPredict 12h as [{\"hour\": 0}]");
    }

    #[test]
    fn test_extract_json_array_from_fenced_reply() {
        let reply = "Sure!\n```json\n[{\"energy\": 0.5}, {\"energy\": 0.6}]\n```";
        assert_eq!(
            extract_json_array(reply),
            Some("[{\"energy\": 0.5}, {\"energy\": 0.6}]")
        );
    }

    #[test]
    fn test_extract_json_array_missing() {
        assert_eq!(extract_json_array("no data today"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn test_forecast_prompt_lists_history() {
        let daily = vec![
            DailyEnergy {
                date: "2025-01-01".to_string(),
                energy: 12.5,
            },
            DailyEnergy {
                date: "2025-01-02".to_string(),
                energy: 9.0,
            },
        ];
        let prompt = forecast_prompt(&daily, 6);
        assert!(prompt.contains("2025-01-01: 12.5 mWh\n2025-01-02: 9 mWh"));
        assert!(prompt.contains("next 6 hours"));
        assert!(!prompt.contains("${"));
    }

    #[test]
    fn test_chat_context_uses_last_five_readings() {
        let buckets: Vec<EnergyBucket> = (0..8)
            .map(|hour| EnergyBucket {
                hour,
                energy: hour as f64,
                voltage: 0.0,
            })
            .collect();
        let context = chat_context(40.0, 3.5, &buckets);
        assert!(context.contains("24h Energy Data Points: 8 readings"));
        assert!(context.contains("Recent Energy: 3mWh at 3:00, 4mWh at 4:00, 5mWh at 5:00, 6mWh at 6:00, 7mWh at 7:00"));
    }
}
