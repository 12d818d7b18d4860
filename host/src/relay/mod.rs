//! ==============================================================================
//! relay/ - http relay in front of the sensor backend
//! ==============================================================================
//!
//! purpose:
//!     mirrors the backend's rest contract under /api and forwards each call
//!     1:1 (same method, same path, same json body). reshaping is limited to:
//!     - /api/sensors never fails; anything but an array becomes []
//!     - /api/download-excel turns the readings list into csv
//!
//!     when the in-process dashboard is enabled it also serves the html page
//!     at / and a few /dashboard routes that drive the controller.
//!
//! routes:
//!
//!     GET  /health
//!     GET  /api/sensors
//!     POST /api/sensor/add
//!     PUT  /api/sensor/update/:sensor_id
//!     POST /api/data
//!     GET  /api/latest?sensor_id=
//!     GET  /api/all?sensor_id=
//!     GET  /api/download-excel?sensor_id=
//!     GET  /
//!     GET  /dashboard/state
//!     POST /dashboard/select?sensor_id=
//!     POST /dashboard/refresh
//!
//! ==============================================================================

pub mod export;
pub mod handlers;
pub mod pages;

use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::upstream::{HttpSensorApi, SensorApi};

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub type SharedDashboard = Arc<Dashboard<dyn SensorApi>>;

#[derive(Clone)]
pub struct RelayState {
    /// client for the external backend
    pub upstream: Arc<HttpSensorApi>,
    /// in-process dashboard, when enabled
    pub dashboard: Option<SharedDashboard>,
}

impl RelayState {
    pub fn new(upstream: HttpSensorApi) -> Self {
        Self { upstream: Arc::new(upstream), dashboard: None }
    }

    pub fn with_dashboard(mut self, dashboard: SharedDashboard) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    fn dashboard(&self) -> Result<&SharedDashboard, AppError> {
        self.dashboard
            .as_ref()
            .ok_or_else(|| AppError::NotFound("dashboard disabled".to_string()))
    }
}

pub fn create_router(state: RelayState) -> Router {
    let api = Router::new()
        .route("/sensors", get(handlers::list_sensors))
        .route("/sensor/add", post(handlers::add_sensor))
        .route("/sensor/update/:sensor_id", put(handlers::update_sensor))
        .route("/data", post(handlers::submit_reading))
        .route("/latest", get(handlers::latest))
        .route("/all", get(handlers::all_readings))
        .route("/download-excel", get(handlers::download_csv));

    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(handlers::health))
        .route("/dashboard/state", get(pages::state_json))
        .route("/dashboard/select", post(pages::select))
        .route("/dashboard/refresh", post(pages::refresh))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
