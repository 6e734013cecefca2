//! Tiling configuration

use crate::SegmentationError;
use serde::{Deserialize, Serialize};

/// Configuration for dividing a volume into overlapping patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Side length of the cubic network input. Must be a multiple of 4
    /// (two pooling layers) so that input and output sizes match.
    pub patch_size: usize,
    /// Voxels discarded from every patch border (network dependent)
    pub crop_margin: usize,
    /// Overlap between neighbouring patches, in voxels
    pub overlap: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            patch_size: 192,
            crop_margin: 25,
            overlap: 55,
        }
    }
}

impl TilingConfig {
    /// Config with the overlap derived from the crop margin (`2 * crop_margin + 5`)
    #[must_use]
    pub fn new(patch_size: usize, crop_margin: usize) -> Self {
        Self {
            patch_size,
            crop_margin,
            overlap: 2 * crop_margin + 5,
        }
    }

    /// Half patch size, distance from a patch center to its border
    #[must_use]
    pub fn half_size(&self) -> usize {
        self.patch_size / 2
    }

    /// Distance between consecutive patch centers
    ///
    /// Zero for configurations whose overlap exceeds the patch size, which
    /// [`validate`](Self::validate) rejects.
    #[must_use]
    pub fn step(&self) -> usize {
        (self.patch_size + 1).saturating_sub(self.overlap)
    }

    /// Side of the trusted central cube of each prediction
    #[must_use]
    pub fn inner_size(&self) -> usize {
        self.patch_size.saturating_sub(2 * self.crop_margin)
    }

    /// Check the tiling constraints
    ///
    /// # Errors
    /// Returns [`SegmentationError::InvalidConfig`] when the patch size is not
    /// a positive multiple of 4, when cropping leaves nothing of the patch, or
    /// when the overlap can not close the gaps left by cropping.
    pub fn validate(&self) -> Result<(), SegmentationError> {
        if self.patch_size == 0 || self.patch_size % 4 != 0 {
            return Err(SegmentationError::InvalidConfig(format!(
                "patch size {} is not a positive multiple of 4",
                self.patch_size
            )));
        }
        if 2 * self.crop_margin >= self.patch_size {
            return Err(SegmentationError::InvalidConfig(format!(
                "crop margin {} leaves no voxels of a {} patch",
                self.crop_margin, self.patch_size
            )));
        }
        if self.overlap <= 2 * self.crop_margin {
            return Err(SegmentationError::InvalidConfig(format!(
                "overlap {} must exceed twice the crop margin ({})",
                self.overlap,
                2 * self.crop_margin
            )));
        }
        if self.overlap > self.patch_size {
            return Err(SegmentationError::InvalidConfig(format!(
                "overlap {} is larger than the patch size {}",
                self.overlap, self.patch_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TilingConfig::default();
        assert_eq!(config.patch_size, 192);
        assert_eq!(config.crop_margin, 25);
        assert_eq!(config.overlap, 55);
        assert_eq!(config, TilingConfig::new(192, 25));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_sizes() {
        let config = TilingConfig::default();
        assert_eq!(config.half_size(), 96);
        assert_eq!(config.step(), 138);
        assert_eq!(config.inner_size(), 142);
        // Cropped regions of neighbouring patches must touch
        assert!(config.step() <= config.inner_size());
    }

    #[test]
    fn test_patch_size_multiple_of_four() {
        let err = TilingConfig::new(190, 25).validate().unwrap_err();
        assert!(matches!(err, SegmentationError::InvalidConfig(_)));
        assert!(TilingConfig::new(0, 0).validate().is_err());
    }

    #[test]
    fn test_overlap_must_exceed_crop() {
        let config = TilingConfig {
            patch_size: 64,
            crop_margin: 10,
            overlap: 20,
        };
        assert!(config.validate().is_err());

        let config = TilingConfig {
            overlap: 21,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_crop_and_overlap_bounds() {
        assert!(TilingConfig::new(16, 8).validate().is_err());
        let config = TilingConfig {
            patch_size: 16,
            crop_margin: 2,
            overlap: 17,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_sizes_of_rejected_config() {
        let config = TilingConfig {
            patch_size: 16,
            crop_margin: 10,
            overlap: 40,
        };
        assert_eq!(config.step(), 0);
        assert_eq!(config.inner_size(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: TilingConfig = serde_json::from_str(r#"{"patch_size": 64}"#).unwrap();
        assert_eq!(config.patch_size, 64);
        assert_eq!(config.crop_margin, 25);
        assert_eq!(config.overlap, 55);
    }
}
