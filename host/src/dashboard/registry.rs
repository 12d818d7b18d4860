//! Sensor registry: listing, add/update, and the default-selection policy.

use crate::domain::{NewSensor, Sensor, SensorPatch, StatusMessage};
use crate::error::ClientError;
use crate::upstream::SensorApi;

use std::sync::Arc;
use tracing::{info, warn};

pub struct SensorRegistry<A: ?Sized> {
    api: Arc<A>,
}

impl<A: SensorApi + ?Sized> SensorRegistry<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Never fails: a broken backend reads as an empty registry.
    pub async fn list(&self) -> Vec<Sensor> {
        self.fetch().await.unwrap_or_default()
    }

    /// Like [`list`](Self::list), but tells a failed listing apart from an
    /// empty registry. The failure has already been logged.
    pub async fn fetch(&self) -> Result<Vec<Sensor>, ClientError> {
        self.api.list_sensors().await.inspect_err(|e| {
            warn!(error = %e, "sensor listing failed, showing no sensors");
        })
    }

    /// Register a sensor. Uniqueness of the id is the backend's call.
    pub async fn add(&self, sensor_id: i64, name: &str, location: Option<&str>) -> Result<StatusMessage, ClientError> {
        if sensor_id <= 0 {
            return Err(ClientError::Validation("Sensor ID must be a positive integer".into()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Sensor name is required".into()));
        }
        let location = location.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);

        let req = NewSensor { sensor_id, sensor_name: name.to_string(), location };
        let ack = self.api.add_sensor(&req).await?;
        info!(sensor_id, status = %ack.status, "sensor added");
        Ok(ack)
    }

    /// Partial update; only the fields set in `patch` change.
    pub async fn update(&self, sensor_id: i64, patch: &SensorPatch) -> Result<StatusMessage, ClientError> {
        if patch.is_empty() {
            return Err(ClientError::Validation("Nothing to update".into()));
        }
        if patch.sensor_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ClientError::Validation("Sensor name is required".into()));
        }
        let ack = self.api.update_sensor(sensor_id, patch).await?;
        info!(sensor_id, status = %ack.status, "sensor updated");
        Ok(ack)
    }
}

/// Which sensor should be selected after the list was reloaded.
///
/// keeps `current` while it is still listed; otherwise falls back to the first
/// listed sensor, or to nothing for an empty list.
pub fn next_selection(current: Option<i64>, sensors: &[Sensor]) -> Option<i64> {
    match current {
        Some(id) if sensors.iter().any(|s| s.sensor_id == id) => Some(id),
        _ => sensors.first().map(|s| s.sensor_id),
    }
}
