//! # Drone Dispatch - Domain Model
//!
//! Core domain entities and value objects for medication delivery drones.
//! These types are the single source of truth across all layers:
//! persistence, API, and the battery audit.
//!
//! A [`Drone`] starts out `Idle` with an empty medication manifest. Cargo is
//! only ever appended through [`Drone::add_medication`], which guards the
//! weight invariant `sum(medication weights) <= weight_limit`.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Heaviest cargo any drone may be rated for, in grams.
pub const MAX_WEIGHT_LIMIT_G: u32 = 500;

/// Upper bound of a battery reading, in percent.
pub const MAX_BATTERY_PCT: u8 = 100;

/// Below this charge a drone refuses new cargo.
pub const MIN_LOADING_BATTERY_PCT: u8 = 25;

/// A drone must be strictly above this charge to be offered for dispatch.
pub const AVAILABILITY_BATTERY_PCT: u8 = 25;

// =============================================================================
// ENUMS
// =============================================================================

/// Drone weight class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneModel {
    Lightweight,
    Middleweight,
    Cruiserweight,
    Heavyweight,
}

impl DroneModel {
    pub const ALL: [Self; 4] = [
        Self::Lightweight,
        Self::Middleweight,
        Self::Cruiserweight,
        Self::Heavyweight,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lightweight => "LIGHTWEIGHT",
            Self::Middleweight => "MIDDLEWEIGHT",
            Self::Cruiserweight => "CRUISERWEIGHT",
            Self::Heavyweight => "HEAVYWEIGHT",
        }
    }
}

impl fmt::Display for DroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneModel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownModel(s.to_string()))
    }
}

/// Drone lifecycle phase.
///
/// Transitions are driven from outside the domain; no ordering between
/// phases is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    Idle,
    Loading,
    Loaded,
    Delivering,
    Delivered,
    Returning,
}

impl DroneState {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Loading,
        Self::Loaded,
        Self::Delivering,
        Self::Delivered,
        Self::Returning,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Loading => "LOADING",
            Self::Loaded => "LOADED",
            Self::Delivering => "DELIVERING",
            Self::Delivered => "DELIVERED",
            Self::Returning => "RETURNING",
        }
    }

    /// Whether the cargo manifest may still change in this phase
    #[must_use]
    pub const fn accepts_cargo(&self) -> bool {
        matches!(self, Self::Idle | Self::Loading)
    }
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownState(s.to_string()))
    }
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A medication package carried by a drone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MedicationDocument")]
pub struct Medication {
    name: String,
    weight: u32,
    code: String,
    image: String,
}

impl Medication {
    /// Build a medication after checking its name and code.
    ///
    /// Names allow ASCII letters, digits, `-` and `_`. Codes allow uppercase
    /// ASCII letters, digits and `_`. `image` is an opaque reference to an
    /// already stored picture and is not inspected.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidName`] or [`DomainError::InvalidCode`], name
    /// checked first.
    pub fn new(
        name: impl Into<String>,
        weight: u32,
        code: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(DomainError::InvalidName(name));
        }

        let code = code.into();
        if !is_valid_code(&code) {
            return Err(DomainError::InvalidCode(code));
        }

        Ok(Self {
            name,
            weight,
            code,
            image: image.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn weight(&self) -> u32 {
        self.weight
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn image(&self) -> &str {
        &self.image
    }
}

/// Wire shape of a [`Medication`]; decoding goes through [`Medication::new`].
#[derive(Deserialize)]
struct MedicationDocument {
    name: String,
    weight: u32,
    code: String,
    image: String,
}

impl TryFrom<MedicationDocument> for Medication {
    type Error = DomainError;

    fn try_from(doc: MedicationDocument) -> Result<Self, Self::Error> {
        Self::new(doc.name, doc.weight, doc.code, doc.image)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Drone entity - a registered delivery drone and its cargo manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DroneDocument")]
pub struct Drone {
    serial: String,
    model: DroneModel,
    weight_limit: u32,
    battery_capacity: u8,
    state: DroneState,
    medications: Vec<Medication>,
}

/// Wire shape of a [`Drone`]. A decoded drone passes the same limit checks
/// as [`Drone::new`] and its manifest must fit within `weight_limit`.
#[derive(Deserialize)]
struct DroneDocument {
    serial: String,
    model: DroneModel,
    weight_limit: u32,
    battery_capacity: u8,
    state: DroneState,
    #[serde(default)]
    medications: Vec<Medication>,
}

impl TryFrom<DroneDocument> for Drone {
    type Error = DomainError;

    fn try_from(doc: DroneDocument) -> Result<Self, Self::Error> {
        let mut drone = Self::new(doc.serial, doc.model, doc.weight_limit, doc.battery_capacity)?;
        drone.state = doc.state;

        let mut loaded: u32 = 0;
        for medication in &doc.medications {
            loaded = loaded
                .checked_add(medication.weight)
                .filter(|total| *total <= drone.weight_limit)
                .ok_or(DomainError::Overweight {
                    loaded,
                    requested: medication.weight,
                    limit: drone.weight_limit,
                })?;
        }
        drone.medications = doc.medications;

        Ok(drone)
    }
}

impl Drone {
    /// Build a new `Idle` drone with no cargo.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidWeightLimit`] above 500 g, then
    /// [`DomainError::InvalidBatteryCapacity`] above 100 %.
    pub fn new(
        serial: impl Into<String>,
        model: DroneModel,
        weight_limit: u32,
        battery_capacity: u8,
    ) -> Result<Self, DomainError> {
        if weight_limit > MAX_WEIGHT_LIMIT_G {
            return Err(DomainError::InvalidWeightLimit(weight_limit));
        }
        if battery_capacity > MAX_BATTERY_PCT {
            return Err(DomainError::InvalidBatteryCapacity(battery_capacity));
        }

        Ok(Self {
            serial: serial.into(),
            model,
            weight_limit,
            battery_capacity,
            state: DroneState::Idle,
            medications: Vec::new(),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub const fn model(&self) -> DroneModel {
        self.model
    }

    pub const fn weight_limit(&self) -> u32 {
        self.weight_limit
    }

    pub const fn battery_capacity(&self) -> u8 {
        self.battery_capacity
    }

    pub const fn state(&self) -> DroneState {
        self.state
    }

    /// Loaded medications in load order
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// Record a lifecycle phase reported from outside.
    pub fn set_state(&mut self, state: DroneState) {
        self.state = state;
    }

    /// Record a battery reading reported from outside.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidBatteryCapacity`] above 100 %; the drone is
    /// left untouched.
    pub fn set_battery_capacity(&mut self, battery_capacity: u8) -> Result<(), DomainError> {
        if battery_capacity > MAX_BATTERY_PCT {
            return Err(DomainError::InvalidBatteryCapacity(battery_capacity));
        }
        self.battery_capacity = battery_capacity;
        Ok(())
    }

    /// Append a medication to the manifest.
    ///
    /// Checks run in a fixed order and the first failure wins: state, then
    /// battery, then weight. Nothing is mutated on failure.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidState`] outside `Idle`/`Loading`,
    /// [`DomainError::LowBattery`] below 25 %,
    /// [`DomainError::Overweight`] when the total would exceed the limit.
    pub fn add_medication(&mut self, medication: Medication) -> Result<(), DomainError> {
        if !self.state.accepts_cargo() {
            return Err(DomainError::InvalidState(self.state));
        }

        if self.battery_capacity < MIN_LOADING_BATTERY_PCT {
            return Err(DomainError::LowBattery(self.battery_capacity));
        }

        let loaded = self.medication_weight();
        let fits = loaded
            .checked_add(medication.weight)
            .is_some_and(|total| total <= self.weight_limit);
        if !fits {
            return Err(DomainError::Overweight {
                loaded,
                requested: medication.weight,
                limit: self.weight_limit,
            });
        }

        self.medications.push(medication);
        Ok(())
    }

    /// Total weight of the loaded medications, in grams
    #[must_use]
    pub fn medication_weight(&self) -> u32 {
        self.medications
            .iter()
            .fold(0u32, |acc, m| acc.saturating_add(m.weight))
    }

    /// Grams that can still be loaded before hitting the limit
    #[must_use]
    pub fn remaining_capacity(&self) -> u32 {
        self.weight_limit.saturating_sub(self.medication_weight())
    }

    /// Whether the drone can be offered for a new dispatch.
    ///
    /// Both bounds are strict: exactly 25 % battery or a full manifest means
    /// unavailable. This threshold differs from the loading check in
    /// [`Self::add_medication`], which only rejects below 25 %.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state.accepts_cargo()
            && self.battery_capacity > AVAILABILITY_BATTERY_PCT
            && self.medication_weight() < self.weight_limit
    }
}

/// A point-in-time battery reading, as emitted by the battery audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub serial: String,
    pub battery_capacity: u8,
    pub recorded_at: DateTime<Utc>,
}

impl BatteryReading {
    #[must_use]
    pub fn from_drone(drone: &Drone) -> Self {
        Self {
            serial: drone.serial.clone(),
            battery_capacity: drone.battery_capacity,
            recorded_at: Utc::now(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level validation errors.
///
/// All of them are raised before any mutation, so the caller may fix the
/// input and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Weight limit {0}g exceeds 500g")]
    InvalidWeightLimit(u32),

    #[error("Battery capacity {0}% exceeds 100%")]
    InvalidBatteryCapacity(u8),

    #[error("Invalid medication name '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidName(String),

    #[error("Invalid medication code '{0}': only uppercase letters, digits and '_' are allowed")]
    InvalidCode(String),

    #[error("Unable to add medication: drone is {0}")]
    InvalidState(DroneState),

    #[error("Unable to add medication: battery at {0}% is below 25%")]
    LowBattery(u8),

    #[error("Unable to add medication: {loaded}g loaded + {requested}g exceeds limit of {limit}g")]
    Overweight {
        loaded: u32,
        requested: u32,
        limit: u32,
    },

    #[error("Unknown drone model: {0}")]
    UnknownModel(String),

    #[error("Unknown drone state: {0}")]
    UnknownState(String),
}

impl DomainError {
    /// Stable machine-readable code for this error kind
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidWeightLimit(_) => "INVALID_WEIGHT_LIMIT",
            Self::InvalidBatteryCapacity(_) => "INVALID_BATTERY_CAPACITY",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::LowBattery(_) => "LOW_BATTERY",
            Self::Overweight { .. } => "OVERWEIGHT",
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::UnknownState(_) => "UNKNOWN_STATE",
        }
    }
}
