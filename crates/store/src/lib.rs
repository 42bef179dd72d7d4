//! Persistence for fleetcast: versioned model artifacts and named
//! datasets, both as JSON files on disk.

pub mod artifacts;
pub mod datasets;
pub mod error;

pub use artifacts::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use datasets::DatasetStore;
pub use error::StoreError;
