//! Volume normalization, padding and unpadding

use crate::SegmentationError;
use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4};

/// Normalize a volume to zero mean and unit variance
///
/// Statistics are accumulated in `f64`; the standard deviation is the
/// population one (divides by the voxel count).
///
/// # Errors
/// Returns [`SegmentationError::DegenerateInput`] for an empty volume or when
/// the standard deviation is zero or not finite.
pub fn normalize(volume: ArrayView3<f32>) -> Result<Array3<f32>, SegmentationError> {
    let count = volume.len();
    if count == 0 {
        return Err(SegmentationError::DegenerateInput(
            "volume has no voxels".to_string(),
        ));
    }

    let n = count as f64;
    let mean = volume.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = volume
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = variance.sqrt();

    if !std.is_finite() || std == 0.0 {
        return Err(SegmentationError::DegenerateInput(format!(
            "standard deviation is {std}, normalization undefined"
        )));
    }

    Ok(volume.mapv(|v| ((f64::from(v) - mean) / std) as f32))
}

/// Zero-pad every axis by `margin` voxels on both sides
#[must_use]
pub fn pad(volume: ArrayView3<f32>, margin: usize) -> Array3<f32> {
    let (d0, d1, d2) = volume.dim();
    let mut padded = Array3::<f32>::zeros((d0 + 2 * margin, d1 + 2 * margin, d2 + 2 * margin));
    padded
        .slice_mut(s![margin..margin + d0, margin..margin + d1, margin..margin + d2])
        .assign(&volume);
    padded
}

/// Remove `margin` voxels from both ends of every spatial axis of a score map
///
/// The class axis is left untouched.
#[must_use]
pub fn unpad_scores(scores: ArrayView4<f32>, margin: usize) -> Array4<f32> {
    let (d0, d1, d2, _) = scores.dim();
    scores
        .slice(s![
            margin..d0 - margin,
            margin..d1 - margin,
            margin..d2 - margin,
            ..
        ])
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_statistics() {
        let volume = Array3::from_shape_fn((4, 5, 6), |(z, y, x)| (z * 30 + y * 6 + x) as f32);
        let normalized = normalize(volume.view()).unwrap();

        let n = normalized.len() as f64;
        let mean = normalized.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = normalized
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_constant_volume_fails() {
        let volume = Array3::from_elem((8, 8, 8), 3.5f32);
        let err = normalize(volume.view()).unwrap_err();
        assert!(matches!(err, SegmentationError::DegenerateInput(_)));
    }

    #[test]
    fn test_normalize_empty_volume_fails() {
        let volume = Array3::<f32>::zeros((0, 4, 4));
        assert!(matches!(
            normalize(volume.view()),
            Err(SegmentationError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_normalize_non_finite_fails() {
        let mut volume = Array3::from_shape_fn((3, 3, 3), |(z, _, _)| z as f32);
        volume[[1, 1, 1]] = f32::NAN;
        assert!(normalize(volume.view()).is_err());
    }

    #[test]
    fn test_pad_and_unpad() {
        let volume = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (1 + z + y + x) as f32);
        let padded = pad(volume.view(), 2);
        assert_eq!(padded.dim(), (6, 7, 8));
        assert_eq!(padded[[0, 0, 0]], 0.0);
        assert_eq!(padded[[2, 2, 2]], 1.0);
        assert_eq!(padded[[3, 4, 5]], volume[[1, 2, 3]]);
        assert_eq!(padded.sum(), volume.sum());

        let scores = padded.clone().insert_axis(ndarray::Axis(3));
        let unpadded = unpad_scores(scores.view(), 2);
        assert_eq!(unpadded.dim(), (2, 3, 4, 1));
        assert_eq!(unpadded.index_axis(ndarray::Axis(3), 0), volume);
    }
}
