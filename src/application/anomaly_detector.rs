// Anomaly detection against a rolling mean baseline
use crate::domain::alert::{AnomalyAlert, Metric, Severity};
use crate::domain::telemetry::Observation;
use chrono::{DateTime, Utc};

const VOLTAGE_HIGH_RATIO: f64 = 0.5;
const VOLTAGE_MEDIUM_RATIO: f64 = 0.7;
const ENERGY_RATIO: f64 = 0.3;
/// Below this mean energy the energy check is too noisy to report.
const ENERGY_FLOOR: f64 = 0.1;

/// Compare the last element of `window` with the window's means.
///
/// Emits at most one voltage alert, at most one energy alert, and an
/// independent zero-output alert when both latest values are exactly zero.
/// Nothing is suppressed across passes: a persisting condition is reported
/// every time.
pub fn detect<O: Observation>(window: &[O], now: DateTime<Utc>) -> Vec<AnomalyAlert> {
    let Some(latest) = window.last() else {
        return Vec::new();
    };

    let count = window.len() as f64;
    let avg_voltage = window.iter().map(|o| o.voltage()).sum::<f64>() / count;
    let avg_energy = window.iter().map(|o| o.energy()).sum::<f64>() / count;
    let latest_voltage = latest.voltage();
    let latest_energy = latest.energy();

    let mut alerts = Vec::new();

    if latest_voltage < avg_voltage * VOLTAGE_HIGH_RATIO {
        alerts.push(AnomalyAlert::new(
            now,
            Severity::High,
            Metric::Voltage,
            "Voltage dropped significantly below average. Check sensor connections.",
            latest_voltage,
            avg_voltage,
        ));
    } else if latest_voltage < avg_voltage * VOLTAGE_MEDIUM_RATIO {
        alerts.push(AnomalyAlert::new(
            now,
            Severity::Medium,
            Metric::Voltage,
            "Voltage is lower than typical. Monitor system performance.",
            latest_voltage,
            avg_voltage,
        ));
    }

    if latest_energy < avg_energy * ENERGY_RATIO && avg_energy > ENERGY_FLOOR {
        alerts.push(AnomalyAlert::new(
            now,
            Severity::Medium,
            Metric::Energy,
            "Energy generation significantly lower than expected.",
            latest_energy,
            avg_energy,
        ));
    }

    if latest_voltage == 0.0 && latest_energy == 0.0 {
        alerts.push(AnomalyAlert::new(
            now,
            Severity::High,
            Metric::System,
            "No energy generation detected. System may be offline.",
            0.0,
            avg_energy,
        ));
    }

    if !alerts.is_empty() {
        tracing::debug!(
            count = alerts.len(),
            avg_voltage,
            avg_energy,
            latest_voltage,
            latest_energy,
            "Anomalies detected"
        );
    }

    alerts
}
