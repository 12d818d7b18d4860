//! ==============================================================================
//! main.rs - moisture host entry point
//! ==============================================================================
//!
//! purpose:
//!     runs the relay in front of the sensor backend and, when enabled, the
//!     dashboard controller that polls it.
//!
//! responsibilities:
//!     - load configuration (config/host.toml, .env, environment)
//!     - initialise tracing
//!     - serve the relay routes and dashboard pages
//!     - load the sensor registry once, which selects the first sensor and
//!       starts the 30s refresh timer
//!     - on ctrl-c, cancel the refresh timer before exiting
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                 │
//!     │  ┌─────────────────────┐      ┌───────────────────────┐  │
//!     │  │ dashboard controller│ ───> │ relay (axum, :3000)   │  │
//!     │  │ (refresh timer)     │ /api │ /api/* , / , /health  │  │
//!     │  └─────────────────────┘      └───────────┬───────────┘  │
//!     └───────────────────────────────────────────┼──────────────┘
//!                                                 │ json over http
//!                                         ┌───────┴───────┐
//!                                         │ flask backend │
//!                                         └───────────────┘
//!
//! ==============================================================================

use anyhow::Result;
use moisture_host::config::HostConfig;
use moisture_host::dashboard::Dashboard;
use moisture_host::relay::{create_router, RelayState};
use moisture_host::upstream::{HttpSensorApi, SensorApi};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // step 1: load configuration (logged once tracing is up)
    let (mut config, source) = HostConfig::load_or_default();
    config.apply_env(|key| std::env::var(key).ok());

    // step 2: logging (RUST_LOG wins over the config file)
    init_tracing(&config.logging.level);
    info!("starting moisture host");
    source.log();
    config.log_summary();

    // step 3: relay state
    let upstream = HttpSensorApi::new(config.backend.base_url.clone(), config.backend_timeout())?;
    let mut state = RelayState::new(upstream);

    let dashboard = if config.dashboard.enabled {
        let api: Arc<dyn SensorApi> =
            Arc::new(HttpSensorApi::new(config.dashboard.api_base_url.clone(), config.backend_timeout())?);
        let dashboard = Arc::new(Dashboard::new(api, config.poll_interval()));
        state = state.with_dashboard(dashboard.clone());
        Some(dashboard)
    } else {
        None
    };

    // step 4: bind before the dashboard starts polling our own /api
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "relay listening");
    let app = create_router(state);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "web server error");
        }
    });

    // step 5: initial registry load; selects the first sensor and arms the timer
    if let Some(dashboard) = &dashboard {
        let sensors = dashboard.reload_sensors().await;
        info!(count = sensors.len(), "sensor registry loaded");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    if let Some(dashboard) = &dashboard {
        dashboard.shutdown().await;
    }
    server.abort();
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
