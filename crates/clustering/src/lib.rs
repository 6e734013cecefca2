//! Object extraction from segmented tomograms
//!
//! A labelmap marks every voxel with a class (0 is background). Foreground
//! voxels are grouped into objects with mean-shift clustering, whose bandwidth
//! is the expected object radius. Each cluster becomes one [`ObjectRecord`]
//! located at the cluster mode, labelled by majority vote of its voxels and
//! sized by its voxel count.
//!
//! Mean-shift cost grows roughly quadratically with the number of foreground
//! voxels inside one bandwidth, so dense segmentations dominate run time.
//!
//! # Example
//! ```no_run
//! use ndarray::Array3;
//! use tomo_detect_clustering::{ClusterConfig, ClusterExtractor};
//!
//! # fn main() -> Result<(), tomo_detect_clustering::ClusterError> {
//! let mut labelmap = Array3::<u16>::zeros((64, 64, 64));
//! labelmap[[32, 32, 32]] = 1;
//!
//! let extractor = ClusterExtractor::new(ClusterConfig::with_radius(8.0))?;
//! let objects = extractor.extract(labelmap.view())?;
//! for obj in &objects {
//!     println!("class {} at ({}, {}, {})", obj.label, obj.x, obj.y, obj.z);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`ObjectRecord`]: tomo_detect_common::ObjectRecord

pub mod config;
pub mod extractor;
pub mod mean_shift;

use thiserror::Error;
use tomo_detect_common::ProcessingError;

pub use config::ClusterConfig;
pub use extractor::ClusterExtractor;
pub use mean_shift::{MeanShift, MeanShiftResult, Point};

/// Errors that can occur during object extraction
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Labelmap contains no foreground voxels")]
    EmptyLabelMap,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ClusterError> for ProcessingError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::EmptyLabelMap => ProcessingError::EmptyLabelMap,
            ClusterError::InvalidConfig(msg) => ProcessingError::Configuration(msg),
        }
    }
}
