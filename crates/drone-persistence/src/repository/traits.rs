//! # Repository Traits
//!
//! Abstract repository interface for the drone fleet.
//! Implementations can be swapped per deployment (in-memory, JSON files, mock).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use drone_domain::Drone;

/// Repository for Drone entity operations, keyed by serial number.
///
/// Each call is atomic for its key: a reader never observes a partially
/// written drone. Nothing spans multiple keys.
#[async_trait]
pub trait DroneRepository: Send + Sync {
    /// Get drone by serial.
    ///
    /// Fails with [`PersistenceError::NotFound`](crate::PersistenceError::NotFound)
    /// when no drone is stored under `serial`.
    async fn get(&self, serial: &str) -> Result<Drone>;

    /// Snapshot of every stored drone, in no particular order
    async fn list(&self) -> Result<Vec<Drone>>;

    /// Insert or fully replace the drone stored under its serial
    async fn save(&self, drone: &Drone) -> Result<()>;
}

/// Repository handle shared between request handlers and background tasks
pub type SharedDroneRepository = Arc<dyn DroneRepository>;
