//! # API Context
//!
//! Application state and dependency injection for request handlers.

use std::sync::Arc;

use dashmap::DashMap;
use drone_persistence::SharedDroneRepository;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::upload::UploadStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Drone repository selected at startup
    pub repo: SharedDroneRepository,

    /// Medication picture storage
    pub uploads: UploadStore,

    /// Serializes read-modify-write cycles per drone
    pub drone_locks: DroneLocks,
}

impl AppState {
    pub fn new(repo: SharedDroneRepository, uploads: UploadStore) -> Self {
        Self {
            repo,
            uploads,
            drone_locks: DroneLocks::default(),
        }
    }
}

/// One async mutex per serial.
///
/// Handlers that load a drone, change it and save it back hold the guard for
/// the whole cycle, so two requests on the same drone cannot drop each
/// other's update. Entries live as long as the process; there is one per
/// serial ever written.
#[derive(Debug, Clone, Default)]
pub struct DroneLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl DroneLocks {
    pub async fn lock(&self, serial: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(serial.to_owned()).or_default().clone();
        lock.lock_owned().await
    }
}
