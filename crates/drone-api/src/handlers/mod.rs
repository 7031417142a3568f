//! # Request Handlers
//!
//! Axum handlers backing the `/api/v1` routes.

pub mod commands;
pub mod queries;

pub use commands::{load_medication, register_drone, report_telemetry};
pub use queries::{available_drones, battery_level, medications};
