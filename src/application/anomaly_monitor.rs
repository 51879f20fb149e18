// Anomaly monitor - Periodic detection passes and the current alert list
use crate::application::anomaly_detector::detect;
use crate::application::energy_repository::EnergyRepository;
use crate::application::session_manager::SessionManager;
use crate::domain::alert::AnomalyAlert;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Where a detection pass takes its window from.
#[derive(Clone)]
pub enum WindowSource {
    /// The live session's ring buffer
    Stream(SessionManager),
    /// The 24-hour hour-bucketed series from the aggregate API
    History(Arc<dyn EnergyRepository>),
}

#[derive(Clone)]
pub struct AnomalyMonitor {
    source: WindowSource,
    alerts: Arc<Mutex<Vec<AnomalyAlert>>>,
}

/// Cancels the periodic re-check when dropped.
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl AnomalyMonitor {
    pub fn new(source: WindowSource) -> Self {
        Self {
            source,
            alerts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run one detection pass and replace the alert list with its result.
    ///
    /// If the history window cannot be fetched the previous alerts are kept.
    pub async fn check_now(&self) -> Vec<AnomalyAlert> {
        let now = Utc::now();
        let detected = match &self.source {
            WindowSource::Stream(session) => detect(&session.recent_samples(), now),
            WindowSource::History(repository) => match repository.energy_generation_24h().await {
                Ok(buckets) => detect(&buckets, now),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch anomaly window; keeping previous alerts");
                    return self.alerts();
                }
            },
        };

        *self.lock() = detected.clone();
        detected
    }

    pub fn alerts(&self) -> Vec<AnomalyAlert> {
        self.lock().clone()
    }

    /// Remove one alert. Future passes are unaffected.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut alerts = self.lock();
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        alerts.len() != before
    }

    /// One pass immediately, then one every `interval` until the handle is dropped.
    pub fn spawn(&self, interval: Duration) -> MonitorHandle {
        let monitor = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let alerts = monitor.check_now().await;
                tracing::debug!(count = alerts.len(), "Anomaly check complete");
            }
        });
        MonitorHandle { task }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AnomalyAlert>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
