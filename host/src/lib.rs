//! # moisture-host
//!
//! Relay and dashboard controller for a soil-moisture monitoring setup.
//!
//! The sensor data lives in an external backend (a Flask API). This crate
//! provides:
//!
//! - [`relay`]: an axum server that mirrors the backend's REST contract under
//!   `/api`, collapses sensor-listing failures into an empty list and adds a
//!   CSV export.
//! - [`dashboard`]: the controller behind the dashboard view. It tracks the
//!   selected sensor, polls its latest reading and history on a cancellable
//!   timer, and recomputes min/max/average/state counts.
//! - [`upstream`]: the JSON-over-HTTP client both of them use.

pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod relay;
pub mod upstream;
