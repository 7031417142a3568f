//! # Repository Module
//!
//! Repository pattern implementations for drone persistence.

pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::{DEFAULT_IO_TIMEOUT, JsonFileDroneRepository};
pub use memory::InMemoryDroneRepository;
pub use traits::{DroneRepository, SharedDroneRepository};
