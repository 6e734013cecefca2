//! On-disk array store
//!
//! A container is a directory and each dataset `name` is the NumPy file
//! `name.npy` inside it, readable by any `.npy` aware tool.

use crate::array_store::{check_dataset_name, read_error, write_error};
use crate::{ArrayStore, StorageError, StorageResult};
use ndarray::{ArrayD, ArrayViewD};
use ndarray_npy::{read_npy, write_npy, ReadableElement, WritableElement};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATASET_EXTENSION: &str = "npy";

/// Array store writing one directory per container
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryStore;

impl DirectoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn dataset_file(path: &Path, dataset: &str) -> PathBuf {
        path.join(format!("{dataset}.{DATASET_EXTENSION}"))
    }

    /// Whether `dataset` exists in the container at `path`
    pub fn contains(&self, path: &Path, dataset: &str) -> bool {
        Self::dataset_file(path, dataset).is_file()
    }
}

impl ArrayStore for DirectoryStore {
    fn read<T: ReadableElement>(&self, path: &Path, dataset: &str) -> StorageResult<ArrayD<T>> {
        check_dataset_name(dataset)?;
        let file = Self::dataset_file(path, dataset);
        if !file.is_file() {
            return Err(StorageError::NotFound(format!("{}:{dataset}", path.display())));
        }

        let array: ArrayD<T> = read_npy(&file).map_err(|e| read_error::<T>(dataset, e))?;
        debug!("Read {}:{dataset} {:?}", path.display(), array.shape());
        Ok(array)
    }

    fn write<T: WritableElement>(
        &self,
        path: &Path,
        dataset: &str,
        array: ArrayViewD<'_, T>,
    ) -> StorageResult<()> {
        check_dataset_name(dataset)?;
        fs::create_dir_all(path)?;
        let file = Self::dataset_file(path, dataset);
        write_npy(&file, &array).map_err(|e| write_error(dataset, e))?;

        info!(
            "Wrote {}:{dataset} ({} {:?})",
            path.display(),
            std::any::type_name::<T>(),
            array.shape()
        );
        Ok(())
    }
}
