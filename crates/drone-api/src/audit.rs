//! Periodic battery audit.
//!
//! Every tick the whole fleet is read from the repository and one
//! `battery_audit` event is logged per drone.

use std::time::Duration;

use drone_domain::BatteryReading;
use drone_persistence::{DroneRepository, PersistenceError, SharedDroneRepository};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Read the current battery level of every drone, sorted by serial.
///
/// # Errors
///
/// Propagates repository failures.
pub async fn collect_battery_readings(
    repo: &dyn DroneRepository,
) -> Result<Vec<BatteryReading>, PersistenceError> {
    let mut readings: Vec<BatteryReading> = repo
        .list()
        .await?
        .iter()
        .map(BatteryReading::from_drone)
        .collect();
    readings.sort_by(|a, b| a.serial.cmp(&b.serial));
    Ok(readings)
}

async fn audit_once(repo: &dyn DroneRepository) {
    match collect_battery_readings(repo).await {
        Ok(readings) => {
            for reading in &readings {
                tracing::info!(
                    target: "battery_audit",
                    serial = %reading.serial,
                    battery_level = reading.battery_capacity,
                    recorded_at = %reading.recorded_at,
                    "Battery level"
                );
            }
            tracing::debug!(drones = readings.len(), "Battery audit complete");
        }
        Err(e) => tracing::warn!(error = %e, "Battery audit failed"),
    }
}

/// Run the audit every `interval` until `shutdown` flips to `true` or its
/// sender is dropped. The first audit runs immediately.
pub fn spawn_battery_audit(
    repo: SharedDroneRepository,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = interval.as_secs(), "Battery audit started");
        loop {
            tokio::select! {
                _ = ticker.tick() => audit_once(repo.as_ref()).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Battery audit stopped");
    })
}
