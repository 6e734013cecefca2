//! Score map to labelmap conversion

use crate::SegmentationError;
use ndarray::{ArrayView4, Axis};
use tomo_detect_common::{Label, LabelMap};

/// Label every voxel with its highest scoring class
///
/// Class index 0 is background. When several classes share the top score the
/// lowest index wins; NaN scores never win.
///
/// # Errors
/// Returns [`SegmentationError::ShapeMismatch`] if the class axis is empty or
/// holds more classes than a [`Label`] can represent.
pub fn to_labelmap(scores: ArrayView4<f32>) -> Result<LabelMap, SegmentationError> {
    let num_classes = scores.len_of(Axis(3));
    if num_classes == 0 || num_classes - 1 > usize::from(Label::MAX) {
        return Err(SegmentationError::ShapeMismatch(format!(
            "score map has {num_classes} classes"
        )));
    }

    Ok(scores.map_axis(Axis(3), |lane| {
        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (class, &score) in lane.iter().enumerate() {
            if score > best_score {
                best = class;
                best_score = score;
            }
        }
        best as Label
    }))
}
