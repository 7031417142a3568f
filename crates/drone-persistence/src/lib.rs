//! # Drone Persistence Library
//!
//! Storage layer for the Drone Dispatch service.
//!
//! ## Architecture
//!
//! This crate implements the Repository pattern with the backend chosen at
//! startup:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DroneRepository trait                     │
//! │                 (get / list / save by serial)               │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   In-Memory (DashMap)   │   │   JSON documents on disk     │
//! │   (tests, ephemeral)    │   │   (durable, atomic writes)   │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drone_persistence::{build_repository, StorageBackend};
//!
//! let repo = build_repository(&StorageBackend::json_file("./data")).await?;
//! repo.save(&drone).await?;
//! let stored = repo.get(drone.serial()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod repository;

// Re-export commonly used types
pub use backend::{StorageBackend, build_repository};
pub use error::{PersistenceError, Result};
pub use repository::{
    DEFAULT_IO_TIMEOUT, DroneRepository, InMemoryDroneRepository, JsonFileDroneRepository,
    SharedDroneRepository,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
