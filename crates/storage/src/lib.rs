//! Persistence of tomograms, labelmaps and object lists
//!
//! Arrays are addressed by a container path and a dataset name, the way
//! tomograms are kept in array files holding several named datasets. Two
//! stores are provided:
//! - [`MemoryStore`]: keeps `.npy` encoded arrays in memory (tests, pipelines
//!   that never touch disk)
//! - [`DirectoryStore`]: one directory per container, one `.npy` file per
//!   dataset
//!
//! Element types are those `ndarray-npy` can encode (`f32`, `u16`, ...).
//!
//! # Example
//!
//! ```rust,no_run
//! use ndarray::Array3;
//! use std::path::Path;
//! use tomo_detect_storage::{ArrayStore, DirectoryStore};
//!
//! # fn main() -> Result<(), tomo_detect_storage::StorageError> {
//! let store = DirectoryStore::new();
//! let tomo = Array3::<f32>::zeros((64, 64, 64));
//! store.write(Path::new("out/tomo1"), "dataset", tomo.view().into_dyn())?;
//! let back = store.read_volume(Path::new("out/tomo1"), "dataset")?;
//! assert_eq!(back.dim(), (64, 64, 64));
//! # Ok(())
//! # }
//! ```

pub mod array_store;
pub mod directory_store;
pub mod memory_store;
pub mod object_list;

use thiserror::Error;
use tomo_detect_common::ProcessingError;

pub use array_store::ArrayStore;
pub use directory_store::DirectoryStore;
pub use memory_store::MemoryStore;
pub use object_list::{read_object_list, write_object_list};

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for ProcessingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IoError(e) => ProcessingError::IoError(e),
            StorageError::SerializationError(e) => ProcessingError::Serialization(e.to_string()),
            other => ProcessingError::Storage(other.to_string()),
        }
    }
}
