//! In-memory repository backed by a sharded concurrent map.
//!
//! Nothing survives a process restart.

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::DroneRepository;
use crate::error::{PersistenceError, Result};
use drone_domain::Drone;

/// Drone repository holding every drone in a `DashMap` keyed by serial.
#[derive(Debug, Default)]
pub struct InMemoryDroneRepository {
    drones: DashMap<String, Drone>,
}

impl InMemoryDroneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored drones
    pub fn len(&self) -> usize {
        self.drones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }
}

#[async_trait]
impl DroneRepository for InMemoryDroneRepository {
    async fn get(&self, serial: &str) -> Result<Drone> {
        self.drones
            .get(serial)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PersistenceError::drone_not_found(serial))
    }

    async fn list(&self) -> Result<Vec<Drone>> {
        Ok(self
            .drones
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn save(&self, drone: &Drone) -> Result<()> {
        let previous = self
            .drones
            .insert(drone.serial().to_string(), drone.clone());

        tracing::debug!(
            serial = %drone.serial(),
            replaced = previous.is_some(),
            "Drone saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drone_domain::{DroneModel, DroneState, Medication};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn loaded_drone(serial: &str) -> Drone {
        let mut drone = Drone::new(serial, DroneModel::Heavyweight, 400, 90).unwrap();
        drone
            .add_medication(Medication::new("Omeprazol-250ml", 120, "OM_101", "/path/to/file").unwrap())
            .unwrap();
        drone.set_state(DroneState::Loaded);
        drone
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let repo = InMemoryDroneRepository::new();
        let drone = loaded_drone("45");

        assert_ok!(repo.save(&drone).await);

        assert_eq!(repo.get("45").await.unwrap(), drone);
    }

    #[tokio::test]
    async fn test_get_unknown_serial() {
        let repo = InMemoryDroneRepository::new();

        let err = assert_err!(repo.get("unknown-serial").await);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let repo = InMemoryDroneRepository::new();
        let drone = loaded_drone("50");

        repo.save(&drone).await.unwrap();
        repo.save(&drone).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get("50").await.unwrap(), drone);
    }

    #[tokio::test]
    async fn test_save_replaces_whole_value() {
        let repo = InMemoryDroneRepository::new();
        repo.save(&loaded_drone("7")).await.unwrap();

        let replacement = Drone::new("7", DroneModel::Lightweight, 100, 30).unwrap();
        repo.save(&replacement).await.unwrap();

        let stored = repo.get("7").await.unwrap();
        assert_eq!(stored, replacement);
        assert!(stored.medications().is_empty());
    }

    #[tokio::test]
    async fn test_caller_copy_is_detached() {
        let repo = InMemoryDroneRepository::new();
        repo.save(&Drone::new("9", DroneModel::Middleweight, 300, 80).unwrap())
            .await
            .unwrap();

        let mut copy = repo.get("9").await.unwrap();
        copy.add_medication(Medication::new("Aspirin", 50, "A01", "other_path").unwrap())
            .unwrap();

        assert!(repo.get("9").await.unwrap().medications().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_of_distinct_serials() {
        const N: usize = 64;
        let repo = Arc::new(InMemoryDroneRepository::new());

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let drone = Drone::new(format!("SN-{i}"), DroneModel::Cruiserweight, 300, 70)
                        .unwrap();
                    repo.save(&drone).await.unwrap();
                    drone
                })
            })
            .collect();

        let mut saved = Vec::with_capacity(N);
        for handle in handles {
            saved.push(handle.await.unwrap());
        }

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), N);
        for drone in &saved {
            assert!(listed.contains(drone));
            assert_eq!(&repo.get(drone.serial()).await.unwrap(), drone);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_to_same_serial() {
        let repo = Arc::new(InMemoryDroneRepository::new());
        let candidates: Vec<Drone> = (0..16u8)
            .map(|battery| Drone::new("shared", DroneModel::Lightweight, 200, battery).unwrap())
            .collect();

        let handles: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|drone| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.save(&drone).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = repo.get("shared").await.unwrap();
        assert!(candidates.contains(&stored));
        assert_eq!(repo.len(), 1);
    }
}
