//! Typed array persistence
//!
//! Datasets are encoded in the NumPy `.npy` format by both stores, so a
//! dataset written by one can be decoded by the other.

use crate::{StorageError, StorageResult};
use ndarray::{Array3, ArrayD, ArrayViewD, Ix3};
use ndarray_npy::{ReadNpyError, ReadableElement, WritableElement, WriteNpyError};
use std::path::Path;
use tomo_detect_common::{shape_string, Label, LabelMap, Volume};

/// Named n-d datasets inside containers addressed by path
pub trait ArrayStore {
    /// # Errors
    /// Returns [`StorageError::NotFound`] when the dataset does not exist and
    /// [`StorageError::TypeMismatch`] when it holds another element type.
    fn read<T: ReadableElement>(&self, path: &Path, dataset: &str) -> StorageResult<ArrayD<T>>;

    /// Create or replace a dataset
    ///
    /// # Errors
    /// Returns an error when the dataset cannot be written.
    fn write<T: WritableElement>(
        &self,
        path: &Path,
        dataset: &str,
        array: ArrayViewD<'_, T>,
    ) -> StorageResult<()>;

    /// Read a 3D `f32` tomogram
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidData`] when the dataset is not 3D.
    fn read_volume(&self, path: &Path, dataset: &str) -> StorageResult<Volume> {
        into_3d(self.read::<f32>(path, dataset)?)
    }

    /// Read a 3D labelmap
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidData`] when the dataset is not 3D.
    fn read_labelmap(&self, path: &Path, dataset: &str) -> StorageResult<LabelMap> {
        into_3d(self.read::<Label>(path, dataset)?)
    }
}

fn into_3d<T>(array: ArrayD<T>) -> StorageResult<Array3<T>> {
    let shape = shape_string(array.shape());
    array
        .into_dimensionality::<Ix3>()
        .map_err(|_| StorageError::InvalidData(format!("expected a 3D dataset, found {shape}")))
}

/// Map a decoding failure of `dataset` read as `T`
pub(crate) fn read_error<T>(dataset: &str, err: ReadNpyError) -> StorageError {
    match err {
        ReadNpyError::Io(e) => StorageError::IoError(e),
        ReadNpyError::WrongDescriptor(descr) => StorageError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: descr.to_string(),
        },
        other => StorageError::InvalidData(format!("{dataset}: {other}")),
    }
}

pub(crate) fn write_error(dataset: &str, err: WriteNpyError) -> StorageError {
    match err {
        WriteNpyError::Io(e) => StorageError::IoError(e),
        other => StorageError::InvalidData(format!("{dataset}: {other}")),
    }
}

/// Reject dataset names that would escape their container
pub(crate) fn check_dataset_name(dataset: &str) -> StorageResult<()> {
    if dataset.is_empty() || dataset == "." || dataset == ".." || dataset.contains(is_separator) {
        return Err(StorageError::InvalidData(format!(
            "invalid dataset name {dataset:?}"
        )));
    }
    Ok(())
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}
