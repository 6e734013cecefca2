//! Patch placement over a padded volume

use crate::{SegmentationError, TilingConfig};
use ndarray::{s, Array3};
use std::ops::Range;

/// Patch centers along one axis of length `len`
///
/// Centers start at `patch_size / 2` and advance by the tiling step. When the
/// last regular center stops short of `len - patch_size / 2`, one more center
/// is placed exactly there so the far border is covered. Axes shorter than the
/// patch yield no centers. `config` must have passed
/// [`TilingConfig::validate`], which guarantees a non-zero step.
pub(crate) fn patch_centers(len: usize, config: &TilingConfig) -> Vec<usize> {
    if len < config.patch_size {
        return Vec::new();
    }

    let half = config.half_size();
    let last = len - half;
    let mut centers: Vec<usize> = (half..last).step_by(config.step()).collect();
    if centers.last().map_or(true, |&c| c < last) {
        centers.push(last);
    }
    centers
}

/// All patch positions for a padded volume
#[derive(Debug, Clone)]
pub struct PatchGrid {
    shape: [usize; 3],
    config: TilingConfig,
    centers: [Vec<usize>; 3],
}

impl PatchGrid {
    /// Lay out patches over a volume of `padded_shape`
    ///
    /// # Errors
    /// Returns [`SegmentationError::InvalidConfig`] if `config` does not
    /// validate, and [`SegmentationError::VolumeTooSmall`] if any axis is
    /// shorter than the patch size.
    pub fn new(padded_shape: [usize; 3], config: &TilingConfig) -> Result<Self, SegmentationError> {
        config.validate()?;
        for (axis, &len) in padded_shape.iter().enumerate() {
            if len < config.patch_size {
                return Err(SegmentationError::VolumeTooSmall {
                    axis,
                    len,
                    patch_size: config.patch_size,
                });
            }
        }

        let centers = padded_shape.map(|len| patch_centers(len, config));
        Ok(Self {
            shape: padded_shape,
            config: *config,
            centers,
        })
    }

    /// Shape of the padded volume this grid covers
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Patch centers along `axis`
    #[must_use]
    pub fn centers(&self, axis: usize) -> &[usize] {
        &self.centers[axis]
    }

    /// Total number of patches
    #[must_use]
    pub fn len(&self) -> usize {
        self.centers.iter().map(Vec::len).product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every patch center, axis 2 varying fastest
    pub fn iter(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.centers[0].iter().flat_map(move |&c0| {
            self.centers[1].iter().flat_map(move |&c1| {
                self.centers[2].iter().map(move |&c2| [c0, c1, c2])
            })
        })
    }

    /// Ranges of the full patch around `center`
    #[must_use]
    pub fn patch_bounds(&self, center: [usize; 3]) -> [Range<usize>; 3] {
        let half = self.config.half_size();
        center.map(|c| c - half..c + half)
    }

    /// Ranges, in volume coordinates, of the trusted center of the patch
    #[must_use]
    pub fn inner_bounds(&self, center: [usize; 3]) -> [Range<usize>; 3] {
        let half_inner = self.config.half_size() - self.config.crop_margin;
        center.map(|c| c - half_inner..c + half_inner)
    }

    /// Ranges, in patch coordinates, of the trusted center of a prediction
    #[must_use]
    pub fn crop_bounds(&self) -> Range<usize> {
        self.config.crop_margin..self.config.patch_size - self.config.crop_margin
    }

    /// Number of patches whose trusted center covers each voxel
    ///
    /// This is the normalization map used to average overlapping predictions.
    #[must_use]
    pub fn coverage_map(&self) -> Array3<f32> {
        let mut coverage = Array3::<f32>::zeros(self.shape);
        for center in self.iter() {
            let [r0, r1, r2] = self.inner_bounds(center);
            coverage
                .slice_mut(s![r0, r1, r2])
                .mapv_inplace(|count| count + 1.0);
        }
        coverage
    }
}
