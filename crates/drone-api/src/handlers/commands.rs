//! # Command Handlers
//!
//! Write operations for the dispatch API.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use drone_domain::{Drone, Medication};

use crate::context::AppState;
use crate::dto::{
    DroneSummary, LoadMedicationData, MedicationView, RegisterDroneRequest, TelemetryUpdate,
};
use crate::error::{ApiError, ApiResult};
use crate::upload::ImageKind;

/// Multipart field holding the picture file
pub const PICTURE_FIELD: &str = "picture";

/// Multipart field holding the JSON medication payload
pub const DATA_FIELD: &str = "data";

/// Register a new drone.
///
/// An existing drone with the same serial is replaced.
pub async fn register_drone(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDroneRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DroneSummary>)> {
    let Json(req) = payload?;

    let drone = Drone::new(req.serial, req.model, req.weight_limit, req.battery)?;
    let _guard = state.drone_locks.lock(drone.serial()).await;
    state.repo.save(&drone).await?;

    tracing::info!(
        serial = %drone.serial(),
        model = %drone.model(),
        weight_limit = drone.weight_limit(),
        battery = drone.battery_capacity(),
        "Drone registered"
    );

    Ok((StatusCode::CREATED, Json(DroneSummary::from(&drone))))
}

/// Load one medication onto a drone.
///
/// Expects a multipart body with a PNG/JPEG `picture` file and a JSON `data`
/// field. The picture is written only once the drone accepted the cargo.
/// Loads on the same drone run one at a time, so each accepted medication
/// ends up in the saved manifest.
pub async fn load_medication(
    State(state): State<AppState>,
    Path(serial): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<MedicationView>> {
    let mut picture: Option<Bytes> = None;
    let mut data: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(PICTURE_FIELD) => picture = Some(field.bytes().await?),
            Some(DATA_FIELD) => data = Some(field.text().await?),
            _ => {}
        }
    }

    let picture = picture
        .ok_or_else(|| ApiError::InvalidUpload(format!("missing '{PICTURE_FIELD}' field")))?;
    let kind = ImageKind::sniff(&picture).ok_or_else(|| {
        ApiError::InvalidUpload("the provided file format is not allowed".to_string())
    })?;

    let data = data.ok_or_else(|| ApiError::InvalidInput(format!("missing '{DATA_FIELD}' field")))?;
    let req: LoadMedicationData =
        serde_json::from_str(&data).map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let image = state.uploads.reserve(kind);
    let medication = Medication::new(req.name, req.weight, req.code, image.public_path.as_str())?;

    let _guard = state.drone_locks.lock(&serial).await;
    let mut drone = state.repo.get(&serial).await?;
    drone.add_medication(medication.clone())?;

    state
        .uploads
        .write(&image, &picture)
        .await
        .map_err(|e| ApiError::Internal(format!("store medication picture: {e}")))?;

    if let Err(e) = state.repo.save(&drone).await {
        state.uploads.discard(&image).await;
        return Err(e.into());
    }

    tracing::info!(
        serial = %serial,
        medication = %medication.name(),
        weight = medication.weight(),
        consumed_weight = drone.medication_weight(),
        "Medication loaded"
    );

    Ok(Json(MedicationView::from(&medication)))
}

/// Record state and battery readings reported for a drone.
pub async fn report_telemetry(
    State(state): State<AppState>,
    Path(serial): Path<String>,
    payload: Result<Json<TelemetryUpdate>, JsonRejection>,
) -> ApiResult<Json<DroneSummary>> {
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::InvalidInput("nothing to update".to_string()));
    }

    let _guard = state.drone_locks.lock(&serial).await;
    let mut drone = state.repo.get(&serial).await?;
    if let Some(battery) = update.battery {
        drone.set_battery_capacity(battery)?;
    }
    if let Some(drone_state) = update.state {
        drone.set_state(drone_state);
    }
    state.repo.save(&drone).await?;

    tracing::info!(
        serial = %serial,
        state = %drone.state(),
        battery = drone.battery_capacity(),
        "Telemetry recorded"
    );

    Ok(Json(DroneSummary::from(&drone)))
}
