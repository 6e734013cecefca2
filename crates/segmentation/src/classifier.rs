//! Per-patch voxel classifier interface

use crate::SegmentationError;
use ndarray::{Array4, ArrayView3};

/// Volumetric voxel classifier
///
/// Receives one normalized cubic patch indexed `[z, y, x]` and returns class
/// scores indexed `[z, y, x, class]` with the same spatial shape. Single
/// channel input is implied; adapters add batch and channel axes when the
/// backing model needs them. Implementations should be deterministic for
/// fixed weights. Errors are propagated to the caller without retry.
pub trait Classifier {
    fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError>;
}

impl<C: Classifier + ?Sized> Classifier for &mut C {
    fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError> {
        (**self).predict(patch)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError> {
        (**self).predict(patch)
    }
}
