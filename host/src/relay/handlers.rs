//! Relay handlers: each one forwards to the backend under the same path.

use super::export;
use super::RelayState;
use crate::error::AppError;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

#[derive(Debug, Default, Deserialize)]
pub struct SensorQuery {
    pub sensor_id: Option<i64>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/sensors
///
/// every failure reads as an empty registry. a backend 404/500 ("no sensors
/// table yet") and a backend that is down look the same to the caller.
pub async fn list_sensors(State(state): State<RelayState>) -> Json<Value> {
    match state.upstream.sensors_json().await {
        Ok(items) => Json(Value::Array(items)),
        Err(e) => {
            match e.status() {
                Some(404) | Some(500) => warn!(error = %e, "backend reported no sensors"),
                _ => warn!(error = %e, "sensor listing failed"),
            }
            Json(json!([]))
        }
    }
}

/// POST /api/sensor/add
pub async fn add_sensor(State(state): State<RelayState>, Json(body): Json<Value>) -> Result<Json<Value>, AppError> {
    forward(&state, Method::POST, "/sensor/add", &body, "adding sensor").await
}

/// PUT /api/sensor/update/:sensor_id
pub async fn update_sensor(
    State(state): State<RelayState>,
    Path(sensor_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let path = format!("/sensor/update/{sensor_id}");
    forward(&state, Method::PUT, &path, &body, "updating sensor").await
}

/// POST /api/data
pub async fn submit_reading(State(state): State<RelayState>, Json(body): Json<Value>) -> Result<Json<Value>, AppError> {
    forward(&state, Method::POST, "/data", &body, "recording sensor data").await
}

/// GET /api/latest
pub async fn latest(State(state): State<RelayState>, Query(q): Query<SensorQuery>) -> Result<Json<Value>, AppError> {
    state.upstream.get_json("/latest", q.sensor_id).await.map(Json).map_err(|e| {
        error!(sensor_id = ?q.sensor_id, error = %e, "fetching latest data failed");
        AppError::Upstream("Failed to fetch latest data")
    })
}

/// GET /api/all
pub async fn all_readings(State(state): State<RelayState>, Query(q): Query<SensorQuery>) -> Result<Json<Value>, AppError> {
    state.upstream.get_json("/all", q.sensor_id).await.map(Json).map_err(|e| {
        error!(sensor_id = ?q.sensor_id, error = %e, "fetching all data failed");
        AppError::Upstream("Failed to fetch data")
    })
}

/// GET /api/download-excel
pub async fn download_csv(State(state): State<RelayState>, Query(q): Query<SensorQuery>) -> Result<Response, AppError> {
    let records = state.upstream.records(q.sensor_id).await.map_err(|e| {
        error!(sensor_id = ?q.sensor_id, error = %e, "generating csv failed");
        AppError::Upstream("Failed to generate CSV")
    })?;

    let body = export::records_to_csv(&records);
    let disposition = format!("attachment; filename={}", export::csv_filename(q.sensor_id));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn forward(state: &RelayState, method: Method, path: &str, body: &Value, action: &str) -> Result<Json<Value>, AppError> {
    match state.upstream.forward(method, path, body).await {
        Ok(answer) => Ok(Json(answer)),
        Err(e) => {
            error!(path, error = %e, "error {action}");
            Err(AppError::from(e))
        }
    }
}
