// Repository trait for historical energy aggregates
use crate::domain::telemetry::{DailyEnergy, EnergyBucket};
use async_trait::async_trait;

#[async_trait]
pub trait EnergyRepository: Send + Sync {
    /// Total energy generated today (mWh)
    async fn total_energy_today(&self) -> anyhow::Result<f64>;

    /// Average voltage across stored readings (V)
    async fn average_voltage(&self) -> anyhow::Result<f64>;

    /// Daily totals for the last 7 days, oldest first
    async fn daily_energy_7_days(&self) -> anyhow::Result<Vec<DailyEnergy>>;

    /// Hour-bucketed energy for the last 24 hours, ordered by hour
    async fn energy_generation_24h(&self) -> anyhow::Result<Vec<EnergyBucket>>;
}
