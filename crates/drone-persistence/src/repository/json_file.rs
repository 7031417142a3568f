//! Durable repository storing one JSON document per drone.
//!
//! Layout: `<root>/drone/<serial>.json`. Writes go to a hidden temporary
//! file in the same directory and are renamed over the target once synced,
//! so readers only ever see complete documents.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::traits::DroneRepository;
use crate::error::{PersistenceError, Result};
use drone_domain::Drone;

/// Collection directory name under the storage root
const DRONE_COLLECTION: &str = "drone";

const DOCUMENT_EXTENSION: &str = "json";

/// Default deadline for a single repository operation
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Drone repository persisting each drone as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileDroneRepository {
    collection_dir: PathBuf,
    io_timeout: Duration,
}

impl JsonFileDroneRepository {
    /// Open (and create if needed) the drone collection under `root`.
    pub async fn open(root: impl AsRef<Path>, io_timeout: Duration) -> Result<Self> {
        let repo = Self {
            collection_dir: root.as_ref().join(DRONE_COLLECTION),
            io_timeout,
        };

        repo.bounded(async {
            tokio::fs::create_dir_all(&repo.collection_dir).await?;
            Ok::<_, PersistenceError>(())
        })
        .await?;

        tracing::info!(
            path = %repo.collection_dir.display(),
            timeout_ms = repo.timeout_ms(),
            "JSON drone store opened"
        );
        Ok(repo)
    }

    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.io_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Run `op` under the configured deadline.
    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.io_timeout, op)
            .await
            .map_err(|_| PersistenceError::Timeout {
                timeout_ms: self.timeout_ms(),
            })?
    }

    /// Path of the document for `serial`, or `None` when the serial cannot
    /// be used as a file name inside the collection.
    fn document_path(&self, serial: &str) -> Option<PathBuf> {
        is_safe_key(serial).then(|| {
            self.collection_dir
                .join(format!("{serial}.{DOCUMENT_EXTENSION}"))
        })
    }

    async fn read_document(&self, serial: &str) -> Result<Drone> {
        let Some(path) = self.document_path(serial) else {
            return Err(PersistenceError::drone_not_found(serial));
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PersistenceError::drone_not_found(serial));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn read_all(&self) -> Result<Vec<Drone>> {
        let mut drones = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.collection_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_document(&path) {
                tracing::debug!(path = %path.display(), "Skipping non-document entry");
                continue;
            }

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                // replaced or removed since the directory was listed
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            drones.push(serde_json::from_slice(&bytes)?);
        }

        Ok(drones)
    }

    async fn write_document(&self, drone: &Drone) -> Result<()> {
        let serial = drone.serial();
        let path = self
            .document_path(serial)
            .ok_or_else(|| PersistenceError::InvalidKey(serial.to_string()))?;
        let tmp_path = self
            .collection_dir
            .join(format!(".{serial}.{}.tmp", Uuid::new_v4()));

        let bytes = serde_json::to_vec_pretty(drone)?;

        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                tracing::warn!(
                    path = %tmp_path.display(),
                    error = %cleanup,
                    "Failed to remove temporary drone document"
                );
            }
            return Err(e.into());
        }

        tracing::debug!(serial = %serial, path = %path.display(), "Drone document written");
        Ok(())
    }
}

#[async_trait]
impl DroneRepository for JsonFileDroneRepository {
    async fn get(&self, serial: &str) -> Result<Drone> {
        self.bounded(self.read_document(serial)).await
    }

    async fn list(&self) -> Result<Vec<Drone>> {
        self.bounded(self.read_all()).await
    }

    async fn save(&self, drone: &Drone) -> Result<()> {
        self.bounded(self.write_document(drone)).await
    }
}

/// Serials become file names, so they must stay inside the collection and
/// must not collide with the hidden temporary files.
fn is_safe_key(serial: &str) -> bool {
    !serial.is_empty()
        && !serial.starts_with('.')
        && !serial.contains(['/', '\\', '\0'])
}

fn is_document(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| !name.starts_with('.'));

    visible
        && path
            .extension()
            .is_some_and(|ext| ext == DOCUMENT_EXTENSION)
}
