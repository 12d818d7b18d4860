//! ==============================================================================
//! upstream.rs - json-over-http client for the sensor backend
//! ==============================================================================
//!
//! purpose:
//!     one client for the backend rest contract:
//!
//!         GET  /sensors                   -> [Sensor]
//!         POST /sensor/add                -> {status}
//!         PUT  /sensor/update/{id}        -> {status}
//!         POST /data                      -> {status}
//!         GET  /latest?sensor_id=         -> MoistureRecord | {status}
//!         GET  /all?sensor_id=            -> [MoistureRecord]
//!
//!     the relay mirrors the same contract under /api, so the dashboard uses
//!     this client too, just with the relay's base url.
//!
//! relationships:
//!     - used by: relay/handlers.rs (base url = external backend)
//!     - used by: dashboard/ (through the SensorApi trait)
//!
//! ==============================================================================

use crate::domain::{MoistureRecord, NewReading, NewSensor, Sensor, SensorPatch, StatusMessage};
use crate::error::ClientError;

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The operations the dashboard needs from whoever holds the sensor data.
#[async_trait]
pub trait SensorApi: Send + Sync {
    async fn list_sensors(&self) -> Result<Vec<Sensor>, ClientError>;
    async fn add_sensor(&self, sensor: &NewSensor) -> Result<StatusMessage, ClientError>;
    async fn update_sensor(&self, sensor_id: i64, patch: &SensorPatch) -> Result<StatusMessage, ClientError>;
    async fn submit_reading(&self, reading: &NewReading) -> Result<StatusMessage, ClientError>;
    /// `Ok(None)` when the backend has no reading for the sensor yet
    async fn latest(&self, sensor_id: i64) -> Result<Option<MoistureRecord>, ClientError>;
    async fn history(&self, sensor_id: i64) -> Result<Vec<MoistureRecord>, ClientError>;
}

#[derive(Clone, Debug)]
pub struct HttpSensorApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSensorApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a json document, optionally scoped to one sensor
    pub async fn get_json(&self, path: &str, sensor_id: Option<i64>) -> Result<Value, ClientError> {
        let mut req = self.client.get(self.url(path));
        if let Some(id) = sensor_id {
            req = req.query(&[("sensor_id", id)]);
        }
        debug!(path, ?sensor_id, "upstream GET");
        read_json(req.send().await?).await
    }

    /// send a json body as-is and return the json answer
    pub async fn forward(&self, method: Method, path: &str, body: &Value) -> Result<Value, ClientError> {
        debug!(%method, path, "upstream forward");
        let resp = self.client.request(method, self.url(path)).json(body).send().await?;
        read_json(resp).await
    }

    /// sensor list, with any non-array body coerced to empty
    pub async fn sensors_json(&self) -> Result<Vec<Value>, ClientError> {
        match self.get_json("/sensors", None).await? {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// readings for one sensor, or for every sensor when `sensor_id` is `None`
    pub async fn records(&self, sensor_id: Option<i64>) -> Result<Vec<MoistureRecord>, ClientError> {
        decode(self.get_json("/all", sensor_id).await?)
    }

    /// csv export; only the relay serves this route
    pub async fn download_csv(&self, sensor_id: Option<i64>) -> Result<String, ClientError> {
        let mut req = self.client.get(self.url("/download-excel"));
        if let Some(id) = sensor_id {
            req = req.query(&[("sensor_id", id)]);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(resp.text().await?)
    }

    async fn mutate(&self, method: Method, path: &str, body: Value) -> Result<StatusMessage, ClientError> {
        let answer = self.forward(method, path, &body).await?;
        // some backend builds answer with a bare string or an empty object
        Ok(serde_json::from_value(answer.clone()).unwrap_or_else(|_| StatusMessage {
            status: match answer {
                Value::String(s) => s,
                _ => "ok".to_string(),
            },
        }))
    }
}

#[async_trait]
impl SensorApi for HttpSensorApi {
    async fn list_sensors(&self) -> Result<Vec<Sensor>, ClientError> {
        let items = self.sensors_json().await?;
        decode(Value::Array(items))
    }

    async fn add_sensor(&self, sensor: &NewSensor) -> Result<StatusMessage, ClientError> {
        let body = serde_json::to_value(sensor).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.mutate(Method::POST, "/sensor/add", body).await
    }

    async fn update_sensor(&self, sensor_id: i64, patch: &SensorPatch) -> Result<StatusMessage, ClientError> {
        let body = serde_json::to_value(patch).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.mutate(Method::PUT, &format!("/sensor/update/{sensor_id}"), body).await
    }

    async fn submit_reading(&self, reading: &NewReading) -> Result<StatusMessage, ClientError> {
        let body = serde_json::to_value(reading).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.mutate(Method::POST, "/data", body).await
    }

    async fn latest(&self, sensor_id: i64) -> Result<Option<MoistureRecord>, ClientError> {
        let value = self.get_json("/latest", Some(sensor_id)).await?;
        // "no data yet" comes back as a status object rather than a record
        if value.get("sensor_id").map_or(true, Value::is_null) {
            return Ok(None);
        }
        decode(value).map(Some)
    }

    async fn history(&self, sensor_id: i64) -> Result<Vec<MoistureRecord>, ClientError> {
        self.records(Some(sensor_id)).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

async fn read_json(resp: Response) -> Result<Value, ClientError> {
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }
    resp.json::<Value>().await.map_err(|e| ClientError::Decode(e.to_string()))
}

async fn status_error(resp: Response) -> ClientError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("Backend error: {}", status.as_u16()));
    ClientError::Status { status: status.as_u16(), message }
}

/// pull a human message out of a json error body
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["status", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}
