//! Dashboard routes backed by the in-process `Dashboard` controller.

use super::RelayState;
use crate::dashboard::{Phase, ViewState};
use crate::domain::Sensor;
use crate::error::AppError;

use axum::{
    extract::{Query, State},
    response::{Html, Json, Redirect},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;

#[derive(Deserialize)]
pub struct SelectParams {
    sensor_id: i64,
}

/// GET /dashboard/state
pub async fn state_json(State(state): State<RelayState>) -> Result<Json<Value>, AppError> {
    let dashboard = state.dashboard()?;
    let sensors = dashboard.sensors().await;
    let view = dashboard.snapshot().await;
    Ok(Json(json!({ "sensors": sensors, "view": view })))
}

/// POST /dashboard/select?sensor_id=
pub async fn select(State(state): State<RelayState>, Query(params): Query<SelectParams>) -> Result<Redirect, AppError> {
    let dashboard = state.dashboard()?;
    dashboard
        .select(params.sensor_id)
        .await
        .map_err(|e| AppError::NotFound(e.user_message()))?;
    Ok(Redirect::to("/"))
}

/// POST /dashboard/refresh
pub async fn refresh(State(state): State<RelayState>) -> Result<Json<Value>, AppError> {
    let dashboard = state.dashboard()?;
    let sensors = dashboard.reload_sensors().await;
    dashboard.refresh().await;
    let view = dashboard.snapshot().await;
    Ok(Json(json!({ "sensors": sensors, "view": view })))
}

/// GET /
pub async fn index(State(state): State<RelayState>) -> Html<String> {
    let Some(dashboard) = state.dashboard.as_ref() else {
        return Html(page("<p>dashboard disabled; the relay is serving <code>/api</code> only.</p>".to_string()));
    };
    let sensors = dashboard.sensors().await;
    let view = dashboard.snapshot().await;
    Html(page(render_body(&sensors, &view)))
}

fn render_body(sensors: &[Sensor], view: &ViewState) -> String {
    let mut out = String::new();

    out.push_str("<section><h2>Select Sensor</h2>");
    if sensors.is_empty() {
        out.push_str("<p>No sensors available</p>");
    } else {
        out.push_str("<ul>");
        for sensor in sensors {
            let marker = if view.selected_sensor_id == Some(sensor.sensor_id) { " (selected)" } else { "" };
            let _ = write!(
                out,
                r#"<li><form method="post" action="/dashboard/select?sensor_id={}"><button>{}</button>{}</form></li>"#,
                sensor.sensor_id,
                html_escape(&sensor.label()),
                marker
            );
        }
        out.push_str("</ul>");
    }
    out.push_str("</section>");

    if view.selected_sensor_id.is_none() {
        return out;
    }

    out.push_str("<section><h2>Current Status</h2>");
    match (&view.latest_record, view.phase) {
        (_, Phase::Loading) if view.last_refreshed.is_none() => out.push_str("<p>Loading...</p>"),
        (Some(latest), _) => {
            let level = latest.display_level();
            let _ = write!(
                out,
                r#"<p>Latest Moisture: <b>{}%</b></p><p style="color:{}">Current State: {} {}</p><p>Last Updated: {}</p>"#,
                latest.moisture,
                level.tone(),
                level.icon(),
                level,
                html_escape(&latest.time_label())
            );
        }
        (None, _) => out.push_str(
            "<p>No data available for this sensor yet. Data will appear as readings are recorded.</p>",
        ),
    }
    out.push_str("</section>");

    let stats = &view.statistics;
    if stats.total > 0 {
        let _ = write!(
            out,
            "<section><h2>Moisture Statistics</h2><p>Minimum {}% | Maximum {}% | Average {}% | Total Records {}</p><ul>",
            stats.min, stats.max, stats.average, stats.total
        );
        for (state, count) in stats.distribution() {
            let _ = write!(out, r#"<li style="color:{}">{}: {}</li>"#, state.tone(), state, count);
        }
        out.push_str("</ul></section>");
    }

    if let Some(id) = view.selected_sensor_id {
        let _ = write!(
            out,
            r#"<section><a href="/api/download-excel?sensor_id={id}">Download CSV</a> | <a href="/api/latest?sensor_id={id}">View JSON</a></section>"#
        );
    }
    out
}

fn page(body: String) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><title>soil moisture</title><meta http-equiv="refresh" content="30"></head>
<body style="font-family: system-ui; padding: 2rem;">
<h1>Soil Moisture Monitor</h1>
{body}
</body>
</html>"#
    )
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
