//! View state owned by the dashboard controller.

use super::stats::DerivedStatistics;
use crate::domain::MoistureRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// nothing selected
    #[default]
    Idle,
    /// fetching latest + history for the selected sensor
    Loading,
    /// both fetches finished; waiting for the next tick
    Settled,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub selected_sensor_id: Option<i64>,
    pub latest_record: Option<MoistureRecord>,
    pub history: Vec<MoistureRecord>,
    pub statistics: DerivedStatistics,
    pub phase: Phase,
    pub is_loading: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    /// bumped on every selection change; results tagged with an older epoch are dropped
    #[serde(skip)]
    pub(crate) epoch: u64,
}

impl ViewState {
    pub fn has_data(&self) -> bool {
        self.latest_record.is_some()
    }

    /// point the view at a new sensor (or none), dropping data that belonged to the old one
    pub(crate) fn select(&mut self, sensor_id: Option<i64>) {
        self.epoch += 1;
        self.selected_sensor_id = sensor_id;
        self.latest_record = None;
        self.history.clear();
        self.statistics = DerivedStatistics::default();
        self.is_loading = sensor_id.is_some();
        self.phase = if sensor_id.is_some() { Phase::Loading } else { Phase::Idle };
    }

    /// true when a refresh started under (`sensor_id`, `epoch`) may still write
    pub(crate) fn is_current(&self, sensor_id: i64, epoch: u64) -> bool {
        self.epoch == epoch && self.selected_sensor_id == Some(sensor_id)
    }
}
