//! Classifier backed by an exported ONNX segmentation network

use crate::{Classifier, SegmentationError};
use ndarray::{Array4, ArrayView3};
use ort::{session::Session, value::TensorRef};
use std::path::Path;
use tomo_detect_common::shape_string;
use tracing::{debug, info};

/// Runs a volumetric segmentation network through ONNX Runtime
///
/// The network takes `[batch, z, y, x, channel]` input with a single channel
/// and produces `[batch, z, y, x, class]` scores.
pub struct OnnxClassifier {
    session: Session,
}

impl OnnxClassifier {
    /// Load the network from an ONNX file
    ///
    /// # Errors
    /// Returns [`SegmentationError::OrtError`] if the session can not be built.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self, SegmentationError> {
        let model_path = model_path.as_ref();
        info!("Loading segmentation model from {:?}", model_path);

        let session = Session::builder()?.commit_from_file(model_path)?;

        info!("Segmentation model loaded successfully");
        Ok(Self { session })
    }

    /// Wrap an already configured session
    #[must_use]
    pub fn from_session(session: Session) -> Self {
        Self { session }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError> {
        let (d0, d1, d2) = patch.dim();
        let input = patch
            .to_owned()
            .into_shape_with_order((1, d0, d1, d2, 1))
            .map_err(|e| SegmentationError::ShapeMismatch(e.to_string()))?;

        let input_tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        debug!("ONNX output shape: {:?}", dims);

        if dims.len() != 5 || dims[0] != 1 || dims[1..4] != [d0, d1, d2] {
            return Err(SegmentationError::ShapeMismatch(format!(
                "network returned {} for a {} patch",
                shape_string(&dims),
                shape_string(&[d0, d1, d2])
            )));
        }

        Array4::from_shape_vec((d0, d1, d2, dims[4]), data.to_vec())
            .map_err(|e| SegmentationError::ShapeMismatch(e.to_string()))
    }
}
