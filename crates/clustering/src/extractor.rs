//! Labelmap to object list conversion

use crate::{ClusterConfig, ClusterError, MeanShift, Point};
use ndarray::ArrayView3;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tomo_detect_common::{Label, Notifier, ObjectList, ObjectRecord, BACKGROUND};
use tracing::{debug, info};

/// Groups labelled voxels into discrete objects
#[derive(Debug, Clone)]
pub struct ClusterExtractor {
    config: ClusterConfig,
    notifier: Notifier,
}

impl ClusterExtractor {
    /// # Errors
    /// Returns [`ClusterError::InvalidConfig`] for a non-positive radius.
    pub fn new(config: ClusterConfig) -> Result<Self, ClusterError> {
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
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Extract one object per mean-shift cluster of foreground voxels
    ///
    /// Every cluster is reported, whatever its size; callers drop small
    /// clusters with [`ObjectList::above_size_threshold`]. An object's class is
    /// the most frequent label among its voxels, the lowest label winning ties.
    ///
    /// # Errors
    /// Returns [`ClusterError::EmptyLabelMap`] when no voxel is labelled.
    pub fn extract(&self, labelmap: ArrayView3<Label>) -> Result<ObjectList, ClusterError> {
        let classes: BTreeSet<Label> = labelmap
            .iter()
            .copied()
            .filter(|&l| l != BACKGROUND)
            .collect();
        if classes.is_empty() {
            return Err(ClusterError::EmptyLabelMap);
        }
        let class_slot: HashMap<Label, usize> = classes
            .iter()
            .enumerate()
            .map(|(slot, &label)| (label, slot))
            .collect();

        let (points, voxel_labels): (Vec<Point>, Vec<Label>) = labelmap
            .indexed_iter()
            .filter(|&(_, &l)| l != BACKGROUND)
            .map(|((z, y, x), &l)| ([z as f64, y as f64, x as f64], l))
            .unzip();
        debug!(
            "{} foreground voxels in {} classes",
            points.len(),
            classes.len()
        );

        self.notifier.notify("Launch clustering ...");
        let start = Instant::now();
        let clusters = MeanShift::new(self.config.cluster_radius)?.fit(&points);
        let elapsed = start.elapsed().as_secs_f64();
        self.notifier
            .notify(&format!("Clustering took {elapsed:.2} seconds"));

        self.notifier.notify("Analyzing clusters ...");
        let mut votes = vec![vec![0usize; classes.len()]; clusters.num_clusters()];
        for (&cluster, label) in clusters.labels.iter().zip(&voxel_labels) {
            votes[cluster][class_slot[label]] += 1;
        }

        let mut objects = ObjectList::new();
        for (center, counts) in clusters.centers.iter().zip(&votes) {
            let size: usize = counts.iter().sum();
            if size == 0 {
                debug!("Skipping empty cluster at {:?}", center);
                continue;
            }

            let mut winner = 0;
            for (slot, &count) in counts.iter().enumerate() {
                if count > counts[winner] {
                    winner = slot;
                }
            }
            let label = classes
                .iter()
                .nth(winner)
                .copied()
                .unwrap_or(BACKGROUND);

            objects.push(ObjectRecord::from_axis_centroid(label, *center, size));
        }

        info!("Extracted {} objects", objects.len());
        self.notifier.notify("Finished !");
        Ok(objects)
    }
}
