//! # Drone Dispatch API
//!
//! REST service for registering delivery drones, loading medications onto
//! them and finding drones available for dispatch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │            (/api/v1 routes, /static pictures)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       AppState                              │
//! │          (SharedDroneRepository, UploadStore)               │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │    drone-domain rules   │   │   drone-persistence backend  │
//! │  (loading, availability)│   │   (memory or JSON files)     │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use context::AppState;
pub use error::{ApiError, ApiResult};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Build the Axum router
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/drones", get(handlers::available_drones))
        .route("/drone", post(handlers::register_drone))
        .route(
            "/drone/{serial}",
            put(handlers::load_medication).patch(handlers::report_telemetry),
        )
        .route("/drone/{serial}/battery", get(handlers::battery_level))
        .route("/drone/{serial}/medications", get(handlers::medications));

    let pictures = ServeDir::new(state.uploads.dir());

    Router::new()
        .nest("/api/v1", api)
        .nest_service(upload::STATIC_PREFIX, pictures)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests;
