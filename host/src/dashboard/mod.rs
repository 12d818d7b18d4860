//! ==============================================================================
//! dashboard/ - sensor selection and telemetry refresh controller
//! ==============================================================================
//!
//! purpose:
//!     keeps the dashboard's view (selected sensor, latest reading, history,
//!     derived statistics) in step with the backend.
//!
//! state machine (per selection):
//!
//!     Idle --select--> Loading --both fetches done--> Settled
//!                         ^                              |
//!                         +------- timer tick -----------+
//!
//!     any selection change stops the timer first, then re-arms it for the
//!     new sensor. the timer mutex is held across stop + re-arm so two
//!     concurrent selections cannot both leave a task behind.
//!
//! stale writes:
//!     every selection bumps ViewState::epoch. a refresh remembers the
//!     (sensor, epoch) it started under and drops its result if the view has
//!     moved on by the time the fetches return.
//!
//! relationships:
//!     - uses: registry.rs (listing + selection policy)
//!     - uses: timer.rs (the single recurring refresh task)
//!     - uses: stats.rs (statistics recomputed on each refresh)
//!     - used by: relay/pages.rs, main.rs
//!
//! ==============================================================================

pub mod registry;
pub mod stats;
pub mod timer;
pub mod view;

pub use registry::{next_selection, SensorRegistry};
pub use stats::DerivedStatistics;
pub use timer::RefreshTimer;
pub use view::{Phase, ViewState};

use crate::domain::{Sensor, SensorPatch, StatusMessage};
use crate::error::ClientError;
use crate::upstream::SensorApi;

use chrono::Utc;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub struct Dashboard<A: SensorApi + ?Sized + 'static> {
    api: Arc<A>,
    registry: SensorRegistry<A>,
    sensors: RwLock<Vec<Sensor>>,
    view: Arc<RwLock<ViewState>>,
    timer: Mutex<RefreshTimer>,
}

impl<A: SensorApi + ?Sized + 'static> Dashboard<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        Self {
            registry: SensorRegistry::new(api.clone()),
            api,
            sensors: RwLock::new(Vec::new()),
            view: Arc::new(RwLock::new(ViewState::default())),
            timer: Mutex::new(RefreshTimer::new(interval)),
        }
    }

    pub async fn sensors(&self) -> Vec<Sensor> {
        self.sensors.read().await.clone()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.view.read().await.clone()
    }

    pub async fn selected_sensor(&self) -> Option<Sensor> {
        let id = self.view.read().await.selected_sensor_id?;
        self.sensors.read().await.iter().find(|s| s.sensor_id == id).cloned()
    }

    /// Reload the registry and apply the default-selection policy.
    ///
    /// a failed listing shows no sensors but leaves the selection alone, so the
    /// user's sensor is still selected once the backend is back.
    pub async fn reload_sensors(&self) -> Vec<Sensor> {
        let sensors = match self.registry.fetch().await {
            Ok(sensors) => sensors,
            Err(_) => {
                self.sensors.write().await.clear();
                return Vec::new();
            }
        };
        *self.sensors.write().await = sensors.clone();

        let current = self.view.read().await.selected_sensor_id;
        let next = next_selection(current, &sensors);
        if next != current {
            debug!(?current, ?next, "selection changed by registry reload");
            self.apply_selection(next).await;
        }
        sensors
    }

    /// Explicit user selection. The id must be in the current registry.
    pub async fn select(&self, sensor_id: i64) -> Result<(), ClientError> {
        let known = self.sensors.read().await.iter().any(|s| s.sensor_id == sensor_id);
        if !known {
            return Err(ClientError::Validation(format!("Unknown sensor {sensor_id}")));
        }
        if self.view.read().await.selected_sensor_id == Some(sensor_id) {
            return Ok(());
        }
        info!(sensor_id, "sensor selected");
        self.apply_selection(Some(sensor_id)).await;
        Ok(())
    }

    pub async fn deselect(&self) {
        self.apply_selection(None).await;
    }

    /// Stop polling; call before dropping the dashboard.
    pub async fn shutdown(&self) {
        self.apply_selection(None).await;
        info!("dashboard stopped");
    }

    /// Run one refresh for the current selection right now.
    ///
    /// returns false when nothing is selected or the result went stale.
    pub async fn refresh(&self) -> bool {
        let (sensor_id, epoch) = {
            let view = self.view.read().await;
            match view.selected_sensor_id {
                Some(id) => (id, view.epoch),
                None => return false,
            }
        };
        refresh_view(self.api.as_ref(), &self.view, sensor_id, epoch).await
    }

    pub async fn add_sensor(&self, sensor_id: i64, name: &str, location: Option<&str>) -> Result<StatusMessage, ClientError> {
        let ack = self.registry.add(sensor_id, name, location).await?;
        self.reload_sensors().await;
        Ok(ack)
    }

    pub async fn update_sensor(&self, sensor_id: i64, patch: &SensorPatch) -> Result<StatusMessage, ClientError> {
        let ack = self.registry.update(sensor_id, patch).await?;
        self.reload_sensors().await;
        Ok(ack)
    }

    /// Recurring refresh tasks currently alive (0 or 1).
    pub async fn live_timers(&self) -> usize {
        self.timer.lock().await.live_count()
    }

    pub async fn interval(&self) -> Duration {
        self.timer.lock().await.period()
    }

    async fn apply_selection(&self, next: Option<i64>) {
        let mut timer = self.timer.lock().await;
        timer.stop().await;

        let epoch = {
            let mut view = self.view.write().await;
            view.select(next);
            view.epoch
        };

        if let Some(sensor_id) = next {
            let api = self.api.clone();
            let view = self.view.clone();
            timer
                .start(Arc::new(move || {
                    let api = api.clone();
                    let view = view.clone();
                    async move {
                        refresh_view(api.as_ref(), &view, sensor_id, epoch).await;
                    }
                    .boxed()
                }))
                .await;
        }
    }
}

/// Fetch latest + history concurrently and apply them if the view still
/// belongs to (`sensor_id`, `epoch`).
async fn refresh_view<A: SensorApi + ?Sized>(api: &A, view: &RwLock<ViewState>, sensor_id: i64, epoch: u64) -> bool {
    {
        let mut v = view.write().await;
        if !v.is_current(sensor_id, epoch) {
            return false;
        }
        v.phase = Phase::Loading;
        v.is_loading = true;
    }

    let (latest, history) = tokio::join!(api.latest(sensor_id), api.history(sensor_id));

    let mut v = view.write().await;
    if !v.is_current(sensor_id, epoch) {
        debug!(sensor_id, "discarding refresh for a sensor no longer selected");
        return false;
    }

    // each fetch fails on its own; a failure clears only its own half
    v.latest_record = match latest {
        Ok(record) => record,
        Err(e) => {
            warn!(sensor_id, error = %e, "latest reading unavailable");
            None
        }
    };
    match history {
        Ok(records) => {
            v.statistics = DerivedStatistics::from_records(&records);
            v.history = records;
        }
        Err(e) => {
            warn!(sensor_id, error = %e, "reading history unavailable");
            v.history.clear();
            v.statistics = DerivedStatistics::default();
        }
    }
    v.phase = Phase::Settled;
    v.is_loading = false;
    v.last_refreshed = Some(Utc::now());
    true
}
