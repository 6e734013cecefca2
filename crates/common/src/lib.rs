//! Common types and utilities for tomogram segmentation and object extraction
//!
//! # Axis convention
//!
//! Every 3D array in this workspace is an ndarray array indexed `[z, y, x]`:
//! axis 0 is Z (slowest varying), axis 2 is X (fastest varying). Score maps add
//! a trailing class axis, `[z, y, x, class]`. Code that tiles or clusters
//! arrays works on raw axis indices; only [`ObjectRecord`] names the axes.

use ndarray::{Array3, Array4};
use thiserror::Error;

pub mod notify;
pub mod objects;

pub use notify::{NotificationSink, Notifier, TracingSink};
pub use objects::{ObjectList, ObjectRecord};

/// Class label stored in a labelmap. `0` is background.
pub type Label = u16;

/// Background label value
pub const BACKGROUND: Label = 0;

/// Tomogram intensities, indexed `[z, y, x]`
pub type Volume = Array3<f32>;

/// Per-voxel class labels, indexed `[z, y, x]`
pub type LabelMap = Array3<Label>;

/// Per-voxel class scores, indexed `[z, y, x, class]`
pub type ScoreMap = Array4<f32>;

/// Processing errors
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Labelmap contains no foreground voxels")]
    EmptyLabelMap,

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        ProcessingError::Serialization(err.to_string())
    }
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Format a shape slice as `ZxYxX...` for messages
#[must_use]
pub fn shape_string(shape: &[usize]) -> String {
    shape
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}
