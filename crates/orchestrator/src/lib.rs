//! Detection pipeline for cryo-electron tomograms
//!
//! Chains the two processing stages on one tomogram:
//! 1. [`TiledSegmenter`] turns the volume into a per-voxel class score map,
//!    which is reduced to a labelmap by argmax
//! 2. [`ClusterExtractor`] groups labelled voxels into objects, and objects
//!    below the configured size threshold are dropped
//!
//! The whole run is configured by a YAML [`PipelineConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ndarray::{Array3, Array4, ArrayView3};
//! use tomo_detect_orchestrator::{DetectionPipeline, PipelineConfig};
//! use tomo_detect_segmentation::{Classifier, SegmentationError};
//!
//! struct Threshold;
//!
//! impl Classifier for Threshold {
//!     fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError> {
//!         let (d0, d1, d2) = patch.dim();
//!         Ok(Array4::from_shape_fn((d0, d1, d2, 2), |(z, y, x, c)| {
//!             let fg = patch[[z, y, x]] > 1.0;
//!             if (c == 1) == fg { 1.0 } else { 0.0 }
//!         }))
//!     }
//! }
//!
//! # fn main() -> tomo_detect_common::Result<()> {
//! let config = PipelineConfig::from_yaml_str("num_classes: 2\nclustering:\n  cluster_radius: 6.0\n")?;
//! let pipeline = DetectionPipeline::new(config)?;
//! let tomogram = Array3::<f32>::zeros((300, 300, 300));
//! let output = pipeline.run(&mut Threshold, tomogram.view())?;
//! println!("{} objects", output.objects.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`TiledSegmenter`]: tomo_detect_segmentation::TiledSegmenter
//! [`ClusterExtractor`]: tomo_detect_clustering::ClusterExtractor

pub mod config;
pub mod pipeline;

pub use config::{OutputConfig, PipelineConfig};
pub use pipeline::{DetectionOutput, DetectionPipeline};
