// Forecast engine - Short-horizon energy projections
use crate::application::energy_repository::EnergyRepository;
use crate::application::prompts::{extract_json_array, forecast_prompt};
use crate::application::text_completion::{CompletionRequest, TextCompletion};
use crate::domain::forecast::ForecastPoint;
use anyhow::Context;
use chrono::{DateTime, Duration, Local, TimeZone, Timelike, Utc};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;

const WORK_HOURS_START: u32 = 8;
const WORK_HOURS_END: u32 = 18;
const WORK_HOURS_ENERGY: f64 = 0.8;
const OFF_HOURS_ENERGY: f64 = 0.3;
const FALLBACK_JITTER: f64 = 0.2;
const FALLBACK_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(default)]
    energy: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Clone)]
pub struct ForecastEngine {
    completion: Arc<dyn TextCompletion>,
    repository: Arc<dyn EnergyRepository>,
}

impl ForecastEngine {
    pub fn new(completion: Arc<dyn TextCompletion>, repository: Arc<dyn EnergyRepository>) -> Self {
        Self {
            completion,
            repository,
        }
    }

    /// One point per hour from now. Never fails: any problem with the
    /// completion path falls back to the work-hours heuristic.
    pub async fn forecast(&self, horizon_hours: usize) -> Vec<ForecastPoint> {
        if horizon_hours == 0 {
            return Vec::new();
        }

        let now = Local::now();
        if self.completion.enabled() {
            match self.predict(horizon_hours, now.with_timezone(&Utc)).await {
                Ok(points) => return points,
                Err(e) => tracing::warn!(error = %e, "Forecast completion failed; using heuristic"),
            }
        }

        fallback_forecast(horizon_hours, &now, &mut rand::thread_rng())
    }

    async fn predict(&self, horizon_hours: usize, now: DateTime<Utc>) -> anyhow::Result<Vec<ForecastPoint>> {
        let daily = self
            .repository
            .daily_energy_7_days()
            .await
            .context("Failed to fetch 7-day energy history")?;

        let response = self
            .completion
            .complete(CompletionRequest::prompt(forecast_prompt(&daily, horizon_hours)))
            .await?;

        parse_predictions(&response, horizon_hours, now)
    }
}

/// Map a model reply onto hourly points starting at `now`.
///
/// A reply with fewer predictions than requested hours is rejected.
pub fn parse_predictions(
    response: &str,
    horizon_hours: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<ForecastPoint>> {
    let json = extract_json_array(response).context("No JSON array in forecast response")?;
    let predictions: Vec<RawPrediction> =
        serde_json::from_str(json).context("Failed to parse forecast predictions")?;

    if predictions.len() < horizon_hours {
        anyhow::bail!(
            "Forecast response covered {} of {} hours",
            predictions.len(),
            horizon_hours
        );
    }

    Ok(predictions
        .into_iter()
        .take(horizon_hours)
        .enumerate()
        .map(|(i, p)| {
            ForecastPoint::new(
                now + Duration::hours(i as i64),
                p.energy.unwrap_or(0.0),
                p.confidence.unwrap_or(0.5),
            )
        })
        .collect())
}

/// Work-hours heuristic: 0.8 between 08:00 and 18:00 local time, 0.3
/// otherwise, plus up to 0.2 of jitter. Confidence is always 0.7.
pub fn fallback_forecast<Tz: TimeZone, R: Rng + ?Sized>(
    horizon_hours: usize,
    now: &DateTime<Tz>,
    rng: &mut R,
) -> Vec<ForecastPoint> {
    let start = now.with_timezone(&Utc);
    let current_hour = now.hour() as usize;

    (0..horizon_hours)
        .map(|i| {
            let hour = ((current_hour + i) % 24) as u32;
            let base = if (WORK_HOURS_START..=WORK_HOURS_END).contains(&hour) {
                WORK_HOURS_ENERGY
            } else {
                OFF_HOURS_ENERGY
            };
            ForecastPoint::new(
                start + Duration::hours(i as i64),
                base + rng.gen_range(0.0..FALLBACK_JITTER),
                FALLBACK_CONFIDENCE,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CompletionError;
    use crate::domain::telemetry::{DailyEnergy, EnergyBucket};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct CannedCompletion {
        enabled: bool,
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl TextCompletion for CannedCompletion {
        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            assert!(request.prompt.contains("7-day energy generation history"));
            self.reply
                .clone()
                .map_err(|_| CompletionError::QuotaExceeded("quota".to_string()))
        }
    }

    struct StaticRepository;

    #[async_trait]
    impl EnergyRepository for StaticRepository {
        async fn total_energy_today(&self) -> anyhow::Result<f64> {
            Ok(10.0)
        }

        async fn average_voltage(&self) -> anyhow::Result<f64> {
            Ok(3.5)
        }

        async fn daily_energy_7_days(&self) -> anyhow::Result<Vec<DailyEnergy>> {
            Ok(vec![DailyEnergy {
                date: "2025-01-01".to_string(),
                energy: 10.0,
            }])
        }

        async fn energy_generation_24h(&self) -> anyhow::Result<Vec<EnergyBucket>> {
            Ok(Vec::new())
        }
    }

    fn engine(enabled: bool, reply: Result<&str, ()>) -> ForecastEngine {
        ForecastEngine::new(
            Arc::new(CannedCompletion {
                enabled,
                reply: reply.map(str::to_string),
            }),
            Arc::new(StaticRepository),
        )
    }

    fn assert_fallback_shape(points: &[ForecastPoint]) {
        for p in points {
            assert_eq!(p.confidence, 0.7);
            assert!(p.predicted_energy >= 0.3 && p.predicted_energy <= 1.0);
        }
    }

    #[test]
    fn test_fallback_starting_at_hour_seven() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 7, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let points = fallback_forecast(3, &now, &mut rng);

        assert_eq!(points.len(), 3);
        assert_fallback_shape(&points);
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        // 07:00 is off-hours, 08:00 and 09:00 are work hours
        assert!(points[0].predicted_energy < 0.5);
        assert!(points[1].predicted_energy >= 0.8);
        assert!(points[2].predicted_energy >= 0.8);
    }

    #[test]
    fn test_fallback_wraps_past_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 18, 30, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let points = fallback_forecast(8, &now, &mut rng);

        assert_eq!(points.len(), 8);
        assert!(points[0].predicted_energy >= 0.8);
        assert!(points[1..].iter().all(|p| p.predicted_energy < 0.5));
    }

    #[test]
    fn test_parse_predictions_defaults_and_clamps() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        let reply = r#"Here you go: [{"hour":0,"energy":0.9,"confidence":0.8},{"hour":1},{"hour":2,"energy":-3,"confidence":4}]"#;
        let points = parse_predictions(reply, 3, now).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].predicted_energy, 0.9);
        assert_eq!(points[1].predicted_energy, 0.0);
        assert_eq!(points[1].confidence, 0.5);
        assert_eq!(points[1].timestamp, now + Duration::hours(1));
        assert_eq!(points[2].predicted_energy, 0.0);
        assert_eq!(points[2].confidence, 1.0);
        assert_eq!(points[2].timestamp, now + Duration::hours(2));
    }

    #[test]
    fn test_parse_predictions_truncates_to_horizon() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        let reply = r#"[{"energy":0.4},{"energy":0.5},{"energy":0.6}]"#;
        let points = parse_predictions(reply, 2, now).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].predicted_energy, 0.5);
    }

    #[test]
    fn test_parse_predictions_rejects_short_reply() {
        let now = Utc::now();
        assert!(parse_predictions(r#"[{"energy":1.0}]"#, 3, now).is_err());
        assert!(parse_predictions("I cannot help with that", 1, now).is_err());
        assert!(parse_predictions("[not json]", 1, now).is_err());
    }

    #[tokio::test]
    async fn test_forecast_uses_completion_when_enabled() {
        let engine = engine(true, Ok(r#"[{"energy":0.11,"confidence":0.9},{"energy":0.22,"confidence":0.9}]"#));
        let points = engine.forecast(2).await;
        let energies: Vec<f64> = points.iter().map(|p| p.predicted_energy).collect();
        assert_eq!(energies, vec![0.11, 0.22]);
    }

    #[tokio::test]
    async fn test_forecast_falls_back_on_upstream_failure() {
        let points = engine(true, Err(())).forecast(5).await;
        assert_eq!(points.len(), 5);
        assert_fallback_shape(&points);
    }

    #[tokio::test]
    async fn test_forecast_falls_back_when_disabled() {
        let points = engine(false, Ok("[]")).forecast(4).await;
        assert_eq!(points.len(), 4);
        assert_fallback_shape(&points);
    }

    #[tokio::test]
    async fn test_zero_horizon_is_empty() {
        assert!(engine(false, Ok("[]")).forecast(0).await.is_empty());
    }
}
