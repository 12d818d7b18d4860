//! ==============================================================================
//! domain.rs - sensor registry and moisture reading types
//! ==============================================================================
//!
//! purpose:
//!     wire types shared by the relay and the dashboard. the backend owns the
//!     authoritative copies; everything here is a decoded snapshot.
//!
//! relationships:
//!     - used by: upstream.rs (decode backend responses)
//!     - used by: relay/ (forwarded bodies, csv export)
//!     - used by: dashboard/ (view state, statistics)
//!
//! ==============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// a registered soil-moisture sensor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// externally assigned, unique
    pub sensor_id: i64,
    pub sensor_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub installed_at: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Sensor {
    /// label used in the sensor picker: "name - location"
    pub fn label(&self) -> String {
        match self.location.as_deref() {
            Some(loc) if !loc.is_empty() => format!("{} - {}", self.sensor_name, loc),
            _ => self.sensor_name.clone(),
        }
    }
}

/// coarse classification bucket for a reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoistureState {
    Dry,
    Moderate,
    Wet,
}

impl MoistureState {
    pub const ALL: [MoistureState; 3] = [MoistureState::Dry, MoistureState::Moderate, MoistureState::Wet];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureState::Dry => "DRY",
            MoistureState::Moderate => "MODERATE",
            MoistureState::Wet => "WET",
        }
    }

    /// icon shown next to the state on the dashboard
    pub fn icon(&self) -> &'static str {
        match self {
            MoistureState::Dry => "🌵",
            MoistureState::Moderate => "🌱",
            MoistureState::Wet => "💧",
        }
    }

    /// css colour used for stat cards and distribution bars
    pub fn tone(&self) -> &'static str {
        match self {
            MoistureState::Dry => "#ef4444",
            MoistureState::Moderate => "#eab308",
            MoistureState::Wet => "#22c55e",
        }
    }
}

impl fmt::Display for MoistureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoistureState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRY" => Ok(MoistureState::Dry),
            "MODERATE" => Ok(MoistureState::Moderate),
            "WET" => Ok(MoistureState::Wet),
            _ => Err(()),
        }
    }
}

/// one timestamped reading; immutable once recorded
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoistureRecord {
    pub sensor_id: i64,
    pub moisture: f64,
    /// kept verbatim so exports reproduce what the backend stored;
    /// a missing or null state becomes ""
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    pub timestamp: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl MoistureRecord {
    /// recognized state, `None` for anything outside DRY/MODERATE/WET
    pub fn level(&self) -> Option<MoistureState> {
        self.state.parse().ok()
    }

    /// state to display; unknown states fall back to MODERATE
    pub fn display_level(&self) -> MoistureState {
        self.level().unwrap_or(MoistureState::Moderate)
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// "HH:MM" label for trend charts
    pub fn time_label(&self) -> String {
        match self.parsed_timestamp() {
            Some(ts) => ts.format("%H:%M").to_string(),
            None => self.timestamp.clone(),
        }
    }
}

/// parse the timestamp shapes the backend is known to emit
///
/// accepts rfc 3339, rfc 2822 / http-date ("Mon, 01 Jan 2024 00:00:00 GMT")
/// and naive iso forms, which are taken as utc.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // flask's http-date uses "GMT", which rfc2822 parsing accepts; this catches
    // the naive database formats
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// body of `POST /sensor/add`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    pub sensor_id: i64,
    pub sensor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// body of `PUT /sensor/update/{id}`; omitted fields keep their stored value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl SensorPatch {
    pub fn is_empty(&self) -> bool {
        self.sensor_name.is_none() && self.location.is_none() && self.active.is_none()
    }
}

/// body of `POST /data`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub sensor_id: i64,
    pub moisture: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<MoistureState>,
}

/// acknowledgement (and error) body used by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
}
