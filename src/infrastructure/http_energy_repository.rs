// Energy aggregates over the telemetry backend's REST API
use crate::application::energy_repository::EnergyRepository;
use crate::domain::telemetry::{DailyEnergy, EnergyBucket};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HttpEnergyRepository {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalEnergyResponse {
    #[serde(default)]
    total_energy: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AverageVoltageResponse {
    #[serde(default)]
    average_voltage: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyTotal {
    #[serde(rename = "_id")]
    id: DayKey,
    #[serde(default)]
    total_energy: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DayKey {
    year: i32,
    month: u32,
    day: u32,
}

impl HttpEnergyRepository {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request {} failed with status {}: {}", endpoint, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }
}

#[async_trait]
impl EnergyRepository for HttpEnergyRepository {
    async fn total_energy_today(&self) -> Result<f64> {
        let response: TotalEnergyResponse = self.get_json("/api/data/totalenergytoday").await?;
        Ok(response.total_energy.unwrap_or_default())
    }

    async fn average_voltage(&self) -> Result<f64> {
        let response: AverageVoltageResponse = self.get_json("/api/data/average-voltage").await?;
        Ok(response.average_voltage.unwrap_or_default())
    }

    async fn daily_energy_7_days(&self) -> Result<Vec<DailyEnergy>> {
        let totals: Vec<DailyTotal> = self.get_json("/api/data/daily-energy-7days").await?;

        Ok(totals
            .into_iter()
            .map(|total| DailyEnergy {
                date: format!("{}-{:02}-{:02}", total.id.year, total.id.month, total.id.day),
                energy: total.total_energy.unwrap_or_default(),
            })
            .collect())
    }

    async fn energy_generation_24h(&self) -> Result<Vec<EnergyBucket>> {
        // Keyed by hour of day: {"8": 12.5, "9": 20.1}
        let by_hour: HashMap<String, Option<f64>> =
            self.get_json("/api/data/energy-generation-24h").await?;

        let mut buckets: Vec<EnergyBucket> = by_hour
            .into_iter()
            .filter_map(|(hour, energy)| match hour.trim().parse::<u32>() {
                Ok(hour) => Some(EnergyBucket {
                    hour,
                    energy: energy.unwrap_or_default(),
                    voltage: 0.0,
                }),
                Err(_) => {
                    tracing::warn!(key = %hour, "Skipping non-numeric hour bucket");
                    None
                }
            })
            .collect();

        buckets.sort_by_key(|bucket| bucket.hour);
        Ok(buckets)
    }
}
