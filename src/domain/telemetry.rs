// Telemetry data domain models
use super::errors::FrameError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One telemetry observation from the harvester.
///
/// Units: volts, milliamps, milliwatts, and a device-specific force unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub force: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, voltage: f64, current: f64, power: f64, force: f64) -> Self {
        Self {
            timestamp,
            voltage,
            current,
            power,
            force,
        }
    }

    fn from_raw(raw: RawSample, received_at: DateTime<Utc>) -> Self {
        let timestamp = raw
            .timestamp
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or(received_at);

        Self::new(
            timestamp,
            non_negative(raw.voltage),
            non_negative(raw.current),
            non_negative(raw.power),
            non_negative(raw.force),
        )
    }
}

/// RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default)]
    voltage: Option<f64>,
    #[serde(default)]
    current: Option<f64>,
    #[serde(default)]
    power: Option<f64>,
    #[serde(default)]
    force: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Batch(Vec<RawSample>),
    Single(RawSample),
}

/// Decode one feed frame into the sample it carries.
///
/// A frame is either a single sample object or an array of them. Only the
/// last element of an array is kept; the rest of the burst is dropped.
/// An empty array yields `None`.
pub fn parse_frame(payload: &str, received_at: DateTime<Utc>) -> Result<Option<Sample>, FrameError> {
    let frame: RawFrame = serde_json::from_str(payload)?;
    let latest = match frame {
        RawFrame::Single(raw) => Some(raw),
        RawFrame::Batch(batch) => batch.into_iter().last(),
    };
    Ok(latest.map(|raw| Sample::from_raw(raw, received_at)))
}

/// One hour bucket of the 24-hour energy series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyBucket {
    pub hour: u32,
    pub energy: f64,
    pub voltage: f64,
}

/// Total energy for one calendar day, `date` formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEnergy {
    pub date: String,
    pub energy: f64,
}

/// Anything the anomaly baseline can be computed over.
pub trait Observation {
    fn voltage(&self) -> f64;
    fn energy(&self) -> f64;
}

impl Observation for Sample {
    fn voltage(&self) -> f64 {
        self.voltage
    }

    // Instantaneous power stands in for energy on the live stream.
    fn energy(&self) -> f64 {
        self.power
    }
}

impl Observation for EnergyBucket {
    fn voltage(&self) -> f64 {
        self.voltage
    }

    fn energy(&self) -> f64 {
        self.energy
    }
}
