//! # Query Handlers
//!
//! Read operations for the dispatch API.

use axum::extract::{Path, State};
use axum::Json;

use crate::context::AppState;
use crate::dto::{BatteryLevel, DroneSummary, MedicationView};
use crate::error::ApiResult;

/// Drones that can take a new dispatch, sorted by serial
pub async fn available_drones(State(state): State<AppState>) -> ApiResult<Json<Vec<DroneSummary>>> {
    let mut available: Vec<DroneSummary> = state
        .repo
        .list()
        .await?
        .iter()
        .filter(|drone| drone.is_available())
        .map(DroneSummary::from)
        .collect();
    available.sort_by(|a, b| a.serial.cmp(&b.serial));

    Ok(Json(available))
}

pub async fn battery_level(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<Json<BatteryLevel>> {
    let drone = state.repo.get(&serial).await?;

    Ok(Json(BatteryLevel {
        battery_level: drone.battery_capacity(),
    }))
}

/// Medication manifest of a drone, in load order
pub async fn medications(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<Json<Vec<MedicationView>>> {
    let drone = state.repo.get(&serial).await?;

    Ok(Json(
        drone.medications().iter().map(MedicationView::from).collect(),
    ))
}
