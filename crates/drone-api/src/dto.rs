//! Request and response bodies for the REST API.

use drone_domain::{Drone, DroneModel, DroneState, Medication};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/drone`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDroneRequest {
    pub serial: String,
    pub model: DroneModel,
    pub weight_limit: u32,
    pub battery: u8,
}

/// `data` part of the multipart body of `PUT /api/v1/drone/{serial}`
#[derive(Debug, Clone, Deserialize)]
pub struct LoadMedicationData {
    pub name: String,
    pub weight: u32,
    pub code: String,
}

/// Body of `PATCH /api/v1/drone/{serial}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryUpdate {
    pub state: Option<DroneState>,
    pub battery: Option<u8>,
}

impl TelemetryUpdate {
    pub const fn is_empty(&self) -> bool {
        self.state.is_none() && self.battery.is_none()
    }
}

/// Drone as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneSummary {
    pub serial: String,
    pub model: DroneModel,
    pub weight_limit: u32,
    pub battery_capacity: u8,
    pub consumed_weight: u32,
    pub remaining_capacity: u32,
    pub state: DroneState,
}

impl From<&Drone> for DroneSummary {
    fn from(drone: &Drone) -> Self {
        Self {
            serial: drone.serial().to_string(),
            model: drone.model(),
            weight_limit: drone.weight_limit(),
            battery_capacity: drone.battery_capacity(),
            consumed_weight: drone.medication_weight(),
            remaining_capacity: drone.remaining_capacity(),
            state: drone.state(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryLevel {
    pub battery_level: u8,
}

/// Loaded medication as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationView {
    pub name: String,
    pub weight: u32,
    pub code: String,
    pub picture_path: String,
}

impl From<&Medication> for MedicationView {
    fn from(medication: &Medication) -> Self {
        Self {
            name: medication.name().to_string(),
            weight: medication.weight(),
            code: medication.code().to_string(),
            picture_path: medication.image().to_string(),
        }
    }
}
