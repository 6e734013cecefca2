//! Tiled inference over volumes larger than the classifier input

use crate::{
    normalize, pad, unpad_scores, Classifier, PatchGrid, SegmentationError, TilingConfig,
};
use ndarray::{s, Array3, Array4, ArrayView3, Axis};
use std::time::Instant;
use tomo_detect_common::{shape_string, Notifier};
use tracing::{debug, info};

/// Segments volumes patch by patch and reassembles a full score map
#[derive(Debug, Clone)]
pub struct TiledSegmenter {
    config: TilingConfig,
    notifier: Notifier,
}

impl TiledSegmenter {
    /// Create a segmenter, checking the tiling configuration once
    ///
    /// # Errors
    /// Returns [`SegmentationError::InvalidConfig`] if the configuration is
    /// rejected by [`TilingConfig::validate`].
    pub fn new(config: TilingConfig) -> Result<Self, SegmentationError> {
        config.validate()?;
        Ok(Self {
            config,
            notifier: Notifier::default(),
        })
    }

    /// Replace the progress notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    /// Patch layout used for a volume of `volume_shape` (before padding)
    ///
    /// # Errors
    /// Returns [`SegmentationError::VolumeTooSmall`] if the padded volume is
    /// smaller than one patch along any axis.
    pub fn patch_grid(&self, volume_shape: [usize; 3]) -> Result<PatchGrid, SegmentationError> {
        let margin = 2 * self.config.crop_margin;
        PatchGrid::new(volume_shape.map(|len| len + margin), &self.config)
    }

    /// Segment `volume` into a score map of shape `[z, y, x, num_classes]`
    ///
    /// The output has the spatial shape of `volume`. Every voxel holds the
    /// average of the trusted (cropped) predictions of all patches covering it.
    ///
    /// # Errors
    /// Fails on a degenerate (constant) volume, a volume smaller than one
    /// patch, a classifier failure, or a classifier output of the wrong shape.
    pub fn infer<C: Classifier + ?Sized>(
        &self,
        classifier: &mut C,
        volume: ArrayView3<f32>,
        num_classes: usize,
    ) -> Result<Array4<f32>, SegmentationError> {
        if num_classes == 0 {
            return Err(SegmentationError::InvalidConfig(
                "number of classes must be at least 1".to_string(),
            ));
        }

        let (d0, d1, d2) = volume.dim();
        let grid = self.patch_grid([d0, d1, d2])?;

        let normalized = normalize(volume)?;
        let padded = pad(normalized.view(), self.config.crop_margin);

        let total = grid.len();
        self.notifier
            .notify(&format!("Data array is divided in {total} patches ..."));

        let start = Instant::now();
        let [p0, p1, p2] = grid.shape();
        let mut scores = Array4::<f32>::zeros((p0, p1, p2, num_classes));
        let mut coverage = Array3::<f32>::zeros((p0, p1, p2));

        let patch_size = self.config.patch_size;
        let expected = (patch_size, patch_size, patch_size, num_classes);
        let crop = grid.crop_bounds();

        for (idx, center) in grid.iter().enumerate() {
            self.notifier
                .notify(&format!("Segmenting patch {} / {} ...", idx + 1, total));
            debug!("Patch {} centered at {:?}", idx + 1, center);

            let [r0, r1, r2] = grid.patch_bounds(center);
            let prediction = classifier.predict(padded.slice(s![r0, r1, r2]))?;
            if prediction.dim() != expected {
                return Err(SegmentationError::ShapeMismatch(format!(
                    "classifier returned {}, expected {}",
                    shape_string(prediction.shape()),
                    shape_string(&[patch_size, patch_size, patch_size, num_classes])
                )));
            }

            let [i0, i1, i2] = grid.inner_bounds(center);
            let trusted = prediction.slice(s![crop.clone(), crop.clone(), crop.clone(), ..]);
            let mut target = scores.slice_mut(s![i0.clone(), i1.clone(), i2.clone(), ..]);
            target += &trusted;
            coverage
                .slice_mut(s![i0, i1, i2])
                .mapv_inplace(|count| count + 1.0);
        }

        // Only the unpadded region is guaranteed to be covered
        let margin = self.config.crop_margin;
        let mut scores = unpad_scores(scores.view(), margin);
        let coverage = coverage.slice(s![margin..margin + d0, margin..margin + d1, margin..margin + d2]);
        scores /= &coverage.insert_axis(Axis(3));

        let elapsed = start.elapsed().as_secs_f64();
        self.notifier
            .notify(&format!("Model took {elapsed:.2} seconds to predict"));
        info!(
            "Segmented {} volume in {} patches",
            shape_string(&[d0, d1, d2]),
            total
        );

        Ok(scores)
    }

    /// Segment a small cubic volume in a single classifier call
    ///
    /// The volume is normalized and padded like in [`TiledSegmenter::infer`],
    /// then the whole padded cube is classified at once. The padded side
    /// `d + 2 * crop_margin` must be a multiple of 4 to match the network's
    /// pooling layers, so with the default crop margin of 25 a `100³` volume
    /// (padded side 150) is rejected while `98³` (148) is accepted. Intended
    /// for synthetic or test data; large tomograms should use the tiled path.
    ///
    /// # Errors
    /// Returns [`SegmentationError::ShapeMismatch`] on non-cubic input or when
    /// `d + 2 * crop_margin` is not divisible by 4, and fails on a degenerate
    /// volume, a classifier failure or a wrong output shape.
    pub fn infer_single_block<C: Classifier + ?Sized>(
        &self,
        classifier: &mut C,
        volume: ArrayView3<f32>,
        num_classes: usize,
    ) -> Result<Array4<f32>, SegmentationError> {
        let (d0, d1, d2) = volume.dim();
        if d0 != d1 || d1 != d2 {
            return Err(SegmentationError::ShapeMismatch(format!(
                "single block inference needs a cubic volume, got {}",
                shape_string(&[d0, d1, d2])
            )));
        }

        let margin = self.config.crop_margin;
        let side = d0 + 2 * margin;
        if side % 4 != 0 {
            return Err(SegmentationError::ShapeMismatch(format!(
                "padded side {side} is not a multiple of 4"
            )));
        }

        let normalized = normalize(volume)?;
        let padded = pad(normalized.view(), margin);

        let start = Instant::now();
        let prediction = classifier.predict(padded.view())?;
        if prediction.dim() != (side, side, side, num_classes) {
            return Err(SegmentationError::ShapeMismatch(format!(
                "classifier returned {}, expected {}",
                shape_string(prediction.shape()),
                shape_string(&[side, side, side, num_classes])
            )));
        }

        let elapsed = start.elapsed().as_secs_f64();
        self.notifier
            .notify(&format!("Model took {elapsed:.2} seconds to predict"));

        Ok(unpad_scores(prediction.view(), margin))
    }
}
