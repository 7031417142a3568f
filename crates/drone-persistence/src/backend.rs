//! Storage backend selection.
//!
//! The backend is picked once at process startup; the rest of the service
//! only sees a [`SharedDroneRepository`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::repository::{
    DEFAULT_IO_TIMEOUT, InMemoryDroneRepository, JsonFileDroneRepository, SharedDroneRepository,
};

/// Which repository implementation backs the service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    #[default]
    InMemory,
    /// One JSON document per drone under `root`
    JsonFile { root: PathBuf, io_timeout: Duration },
}

impl StorageBackend {
    pub fn json_file(root: impl Into<PathBuf>) -> Self {
        Self::JsonFile {
            root: root.into(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::InMemory => "memory",
            Self::JsonFile { .. } => "json",
        }
    }
}

/// Build the repository for `backend`.
///
/// # Errors
///
/// Returns an error if the durable store's directory cannot be created.
pub async fn build_repository(backend: &StorageBackend) -> Result<SharedDroneRepository> {
    let repo: SharedDroneRepository = match backend {
        StorageBackend::InMemory => Arc::new(InMemoryDroneRepository::new()),
        StorageBackend::JsonFile { root, io_timeout } => {
            Arc::new(JsonFileDroneRepository::open(root, *io_timeout).await?)
        }
    };

    tracing::info!(backend = backend.name(), "Drone repository ready");
    Ok(repo)
}
