//! Volume to object list detection pipeline

use crate::PipelineConfig;
use ndarray::ArrayView3;
use std::path::Path;
use std::time::Instant;
use tomo_detect_clustering::{ClusterError, ClusterExtractor};
use tomo_detect_common::{shape_string, LabelMap, Notifier, ObjectList, Result, ScoreMap};
use tomo_detect_segmentation::{to_labelmap, Classifier, TiledSegmenter};
use tomo_detect_storage::{write_object_list, ArrayStore};
use tracing::{info, warn};

/// Everything produced for one tomogram
#[derive(Debug, Clone)]
pub struct DetectionOutput {
    /// Per-class scores, `[z, y, x, class]`
    pub scoremap: ScoreMap,
    pub labelmap: LabelMap,
    /// Objects at or above the size threshold, with ids assigned
    pub objects: ObjectList,
}

/// Segmentation followed by object extraction
#[derive(Debug, Clone)]
pub struct DetectionPipeline {
    config: PipelineConfig,
    segmenter: TiledSegmenter,
    extractor: ClusterExtractor,
}

impl DetectionPipeline {
    /// # Errors
    /// Returns [`ProcessingError::Configuration`](tomo_detect_common::ProcessingError::Configuration)
    /// if `config` is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let segmenter = TiledSegmenter::new(config.tiling)?;
        let extractor = ClusterExtractor::new(config.clustering)?;
        Ok(Self {
            config,
            segmenter,
            extractor,
        })
    }

    /// Route progress messages of both stages to `notifier`
    #[must_use]
    pub fn with_notifier(self, notifier: Notifier) -> Self {
        Self {
            segmenter: self.segmenter.with_notifier(notifier.clone()),
            extractor: self.extractor.with_notifier(notifier),
            config: self.config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Segment `volume` and extract its objects
    ///
    /// A volume without any foreground voxel yields an empty object list.
    ///
    /// # Errors
    /// Propagates segmentation failures (degenerate volume, volume too small,
    /// classifier errors, wrong classifier output shape).
    pub fn run<C: Classifier + ?Sized>(
        &self,
        classifier: &mut C,
        volume: ArrayView3<f32>,
    ) -> Result<DetectionOutput> {
        let start = Instant::now();
        let num_classes = self.config.num_classes;

        let scoremap = if self.config.tiled {
            self.segmenter.infer(classifier, volume, num_classes)?
        } else {
            self.segmenter
                .infer_single_block(classifier, volume, num_classes)?
        };
        let labelmap = to_labelmap(scoremap.view())?;

        let mut objects = match self.extractor.extract(labelmap.view()) {
            Ok(objects) => objects.above_size_threshold(self.config.clustering.size_threshold),
            Err(ClusterError::EmptyLabelMap) => {
                warn!("No foreground voxels found, no objects extracted");
                ObjectList::new()
            }
            Err(e) => return Err(e.into()),
        };
        objects.assign_ids();

        info!(
            "Detected {} objects in {:.2} seconds",
            objects.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(DetectionOutput {
            scoremap,
            labelmap,
            objects,
        })
    }

    /// Run on a tomogram read from `store` and write the results back
    ///
    /// The volume is read from `input` and the labelmap (and score map, when
    /// configured) are written to the `output` container. The object list is
    /// written as JSON to `output/<objects_file>`.
    ///
    /// # Errors
    /// Fails if the volume cannot be read, the pipeline fails, or any result
    /// cannot be written.
    pub fn run_with_store<C, S>(
        &self,
        classifier: &mut C,
        store: &S,
        input: &Path,
        output: &Path,
    ) -> Result<DetectionOutput>
    where
        C: Classifier + ?Sized,
        S: ArrayStore,
    {
        let names = &self.config.output;
        let volume = store.read_volume(input, &names.volume_dataset)?;
        info!(
            "Loaded tomogram {} from {}",
            shape_string(volume.shape()),
            input.display()
        );

        let detection = self.run(classifier, volume.view())?;

        store.write(
            output,
            &names.labelmap_dataset,
            detection.labelmap.view().into_dyn(),
        )?;
        if let Some(dataset) = &names.scoremap_dataset {
            store.write(output, dataset, detection.scoremap.view().into_dyn())?;
        }
        write_object_list(&output.join(&names.objects_file), &detection.objects)?;

        Ok(detection)
    }
}
