//! Detected objects and object lists

use crate::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One detected macromolecule
///
/// Coordinates are in voxels of the unpadded tomogram. `x` is the axis-2
/// index, `y` the axis-1 index and `z` the axis-0 index of a `[z, y, x]`
/// array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Class label (>= 1)
    pub label: Label,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Number of voxels in the cluster this object was extracted from
    pub cluster_size: usize,
    /// Object identifier, if assigned by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_id: Option<usize>,
    /// Index of the tomogram the object belongs to, for multi-tomogram lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tomo_idx: Option<usize>,
}

impl ObjectRecord {
    /// Create a record from a centroid given in array axis order `[z, y, x]`
    #[must_use]
    pub fn from_axis_centroid(label: Label, centroid: [f64; 3], cluster_size: usize) -> Self {
        Self {
            label,
            x: centroid[2],
            y: centroid[1],
            z: centroid[0],
            cluster_size,
            obj_id: None,
            tomo_idx: None,
        }
    }
}

/// Ordered list of detections
///
/// Order is the order in which clusters were processed and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectList {
    objects: Vec<ObjectRecord>,
}

impl ObjectList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: ObjectRecord) {
        self.objects.push(object);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObjectRecord> {
        self.objects.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ObjectRecord> {
        self.objects.get(index)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ObjectRecord] {
        &self.objects
    }

    /// Distinct class labels present in the list, ascending
    #[must_use]
    pub fn labels(&self) -> BTreeSet<Label> {
        self.objects.iter().map(|o| o.label).collect()
    }

    /// Objects of a single class
    #[must_use]
    pub fn with_label(&self, label: Label) -> Self {
        self.objects
            .iter()
            .filter(|o| o.label == label)
            .cloned()
            .collect()
    }

    /// Objects whose cluster holds at least `threshold` voxels
    #[must_use]
    pub fn above_size_threshold(&self, threshold: usize) -> Self {
        self.objects
            .iter()
            .filter(|o| o.cluster_size >= threshold)
            .cloned()
            .collect()
    }

    /// Assign sequential identifiers starting at 0
    pub fn assign_ids(&mut self) {
        for (idx, object) in self.objects.iter_mut().enumerate() {
            object.obj_id = Some(idx);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ObjectRecord> {
        self.objects
    }
}

impl FromIterator<ObjectRecord> for ObjectList {
    fn from_iter<I: IntoIterator<Item = ObjectRecord>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ObjectRecord>> for ObjectList {
    fn from(objects: Vec<ObjectRecord>) -> Self {
        Self { objects }
    }
}

impl IntoIterator for ObjectList {
    type Item = ObjectRecord;
    type IntoIter = std::vec::IntoIter<ObjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectList {
    type Item = &'a ObjectRecord;
    type IntoIter = std::slice::Iter<'a, ObjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
