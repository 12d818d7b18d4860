//! In-process stand-in for the Flask backend, bound to 127.0.0.1:0.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use moisture_host::domain::{MoistureRecord, Sensor};
use moisture_host::relay::{create_router, RelayState};
use moisture_host::upstream::HttpSensorApi;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct Store {
    pub sensors: Vec<Sensor>,
    pub records: Vec<MoistureRecord>,
    /// answer GET /sensors with this status instead of the list
    pub sensors_status: Option<u16>,
    /// answer GET /sensors with this body instead of the list
    pub sensors_body: Option<Value>,
    /// answer GET /all with this status
    pub all_status: Option<u16>,
    /// answer GET /all with this body instead of the records
    pub all_body: Option<Value>,
}

pub type SharedStore = Arc<Mutex<Store>>;

pub struct FakeBackend {
    pub addr: SocketAddr,
    pub store: SharedStore,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let store: SharedStore = Arc::new(Mutex::new(Store::default()));
        let app = Router::new()
            .route("/sensors", get(list_sensors))
            .route("/sensor/add", post(add_sensor))
            .route("/sensor/update/:sensor_id", put(update_sensor))
            .route("/data", post(add_reading))
            .route("/latest", get(latest))
            .route("/all", get(all))
            .with_state(store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, store }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self) -> HttpSensorApi {
        HttpSensorApi::new(self.url(), Duration::from_secs(5)).unwrap()
    }

    pub fn with(&self, f: impl FnOnce(&mut Store)) {
        f(&mut self.store.lock().unwrap());
    }
}

/// router of a relay that forwards to `backend_url`
pub fn relay_for(backend_url: &str) -> Router {
    let upstream = HttpSensorApi::new(backend_url, Duration::from_secs(5)).unwrap();
    create_router(RelayState::new(upstream))
}

/// serve a relay on 127.0.0.1:0 and return its base url
pub async fn serve_relay(backend_url: &str) -> String {
    let app = relay_for(backend_url);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// a url nothing is listening on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn sensor(id: i64, name: &str) -> Sensor {
    Sensor {
        sensor_id: id,
        sensor_name: name.to_string(),
        location: None,
        installed_at: Some("2024-01-01T00:00:00Z".to_string()),
        active: true,
    }
}

pub fn record(sensor_id: i64, moisture: f64, state: &str, timestamp: &str) -> MoistureRecord {
    MoistureRecord {
        sensor_id,
        moisture,
        state: state.to_string(),
        timestamp: timestamp.to_string(),
    }
}

#[derive(Deserialize)]
struct SensorQuery {
    sensor_id: Option<i64>,
}

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn list_sensors(State(store): State<SharedStore>) -> Response {
    let store = store.lock().unwrap();
    if let Some(code) = store.sensors_status {
        return (status_of(code), Json(json!({ "status": "Database error" }))).into_response();
    }
    if let Some(body) = &store.sensors_body {
        return Json(body.clone()).into_response();
    }
    Json(json!(store.sensors)).into_response()
}

async fn add_sensor(State(store): State<SharedStore>, Json(body): Json<Value>) -> Response {
    let mut store = store.lock().unwrap();
    let Some(id) = body.get("sensor_id").and_then(Value::as_i64) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "sensor_id is required" }))).into_response();
    };
    if store.sensors.iter().any(|s| s.sensor_id == id) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "Sensor ID already exists" }))).into_response();
    }
    let name = body.get("sensor_name").and_then(Value::as_str).unwrap_or_default();
    let mut sensor = sensor(id, name);
    sensor.location = body.get("location").and_then(Value::as_str).map(str::to_string);
    store.sensors.push(sensor);
    Json(json!({ "status": "Sensor added successfully" })).into_response()
}

async fn update_sensor(
    State(store): State<SharedStore>,
    Path(sensor_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = store.lock().unwrap();
    let Some(sensor) = store.sensors.iter_mut().find(|s| s.sensor_id == sensor_id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "status": "Sensor not found" }))).into_response();
    };
    if let Some(name) = body.get("sensor_name").and_then(Value::as_str) {
        sensor.sensor_name = name.to_string();
    }
    if let Some(location) = body.get("location").and_then(Value::as_str) {
        sensor.location = Some(location.to_string());
    }
    if let Some(active) = body.get("active").and_then(Value::as_bool) {
        sensor.active = active;
    }
    Json(json!({ "status": "Sensor updated successfully" })).into_response()
}

async fn add_reading(State(store): State<SharedStore>, Json(body): Json<Value>) -> Response {
    let mut store = store.lock().unwrap();
    let (Some(id), Some(moisture)) = (
        body.get("sensor_id").and_then(Value::as_i64),
        body.get("moisture").and_then(Value::as_f64),
    ) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "sensor_id and moisture are required" })))
            .into_response();
    };
    let state = body
        .get("state")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| classify(moisture).to_string());
    let timestamp = format!("2024-01-01T00:{:02}:00Z", store.records.len() % 60);
    store.records.push(record(id, moisture, &state, &timestamp));
    Json(json!({ "status": "Data recorded" })).into_response()
}

fn classify(moisture: f64) -> &'static str {
    if moisture >= 600.0 {
        "DRY"
    } else if moisture >= 300.0 {
        "MODERATE"
    } else {
        "WET"
    }
}

async fn latest(State(store): State<SharedStore>, Query(q): Query<SensorQuery>) -> Response {
    let store = store.lock().unwrap();
    let found = store
        .records
        .iter()
        .rev()
        .find(|r| q.sensor_id.map_or(true, |id| r.sensor_id == id));
    match found {
        Some(r) => Json(json!(r)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "status": "No data found" }))).into_response(),
    }
}

async fn all(State(store): State<SharedStore>, Query(q): Query<SensorQuery>) -> Response {
    let store = store.lock().unwrap();
    if let Some(code) = store.all_status {
        return (status_of(code), Json(json!({ "status": "Database error" }))).into_response();
    }
    if let Some(body) = &store.all_body {
        return Json(body.clone()).into_response();
    }
    let records: Vec<_> = store
        .records
        .iter()
        .filter(|r| q.sensor_id.map_or(true, |id| r.sensor_id == id))
        .cloned()
        .collect();
    Json(json!(records)).into_response()
}
