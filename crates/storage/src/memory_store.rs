//! In-memory array store

use crate::array_store::{check_dataset_name, read_error, write_error};
use crate::{ArrayStore, StorageError, StorageResult};
use ndarray::{ArrayD, ArrayViewD};
use ndarray_npy::{ReadNpyExt, ReadableElement, WritableElement, WriteNpyExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

type DatasetKey = (PathBuf, String);

/// Array store backed by a map of `.npy` encoded datasets
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: Mutex<HashMap<DatasetKey, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are replaced whole, so a poisoned map is still consistent
    fn datasets(&self) -> MutexGuard<'_, HashMap<DatasetKey, Vec<u8>>> {
        self.datasets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored datasets
    pub fn len(&self) -> usize {
        self.datasets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &Path, dataset: &str) -> bool {
        self.datasets()
            .contains_key(&(path.to_path_buf(), dataset.to_string()))
    }
}

impl ArrayStore for MemoryStore {
    fn read<T: ReadableElement>(&self, path: &Path, dataset: &str) -> StorageResult<ArrayD<T>> {
        let datasets = self.datasets();
        let bytes = datasets
            .get(&(path.to_path_buf(), dataset.to_string()))
            .ok_or_else(|| StorageError::NotFound(format!("{}:{dataset}", path.display())))?;
        ArrayD::<T>::read_npy(bytes.as_slice()).map_err(|e| read_error::<T>(dataset, e))
    }

    fn write<T: WritableElement>(
        &self,
        path: &Path,
        dataset: &str,
        array: ArrayViewD<'_, T>,
    ) -> StorageResult<()> {
        check_dataset_name(dataset)?;
        let mut bytes = Vec::new();
        array
            .write_npy(&mut bytes)
            .map_err(|e| write_error(dataset, e))?;
        debug!("Storing {}:{dataset} ({} bytes)", path.display(), bytes.len());
        self.datasets()
            .insert((path.to_path_buf(), dataset.to_string()), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use std::sync::Arc;

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        let path = Path::new("tomo1");
        let volume = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (z * 100 + y * 10 + x) as f32);

        store.write(path, "dataset", volume.view().into_dyn()).unwrap();
        assert!(store.contains(path, "dataset"));
        assert_eq!(store.read_volume(path, "dataset").unwrap(), volume);
    }

    #[test]
    fn test_missing_dataset() {
        let store = MemoryStore::new();
        let err = store.read::<f32>(Path::new("tomo1"), "dataset").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_datasets_are_per_container() {
        let store = MemoryStore::new();
        let a = Array3::<u16>::from_elem((2, 2, 2), 1);
        let b = Array3::<u16>::from_elem((2, 2, 2), 2);
        store.write(Path::new("a"), "labelmap", a.view().into_dyn()).unwrap();
        store.write(Path::new("b"), "labelmap", b.view().into_dyn()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.read_labelmap(Path::new("a"), "labelmap").unwrap(), a);
        assert_eq!(store.read_labelmap(Path::new("b"), "labelmap").unwrap(), b);
    }

    #[test]
    fn test_overwrite_changes_type() {
        let store = MemoryStore::new();
        let path = Path::new("tomo");
        store
            .write(path, "data", Array3::<f32>::zeros((2, 2, 2)).view().into_dyn())
            .unwrap();
        store
            .write(path, "data", Array3::<u8>::ones((2, 2, 2)).view().into_dyn())
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.read::<f32>(path, "data"),
            Err(StorageError::TypeMismatch { .. })
        ));
        assert_eq!(store.read::<u8>(path, "data").unwrap().sum(), 8);
    }

    #[test]
    fn test_poisoned_lock_still_serves_datasets() {
        let store = Arc::new(MemoryStore::new());
        let path = Path::new("tomo");
        let labels = Array3::<u16>::from_elem((2, 3, 4), 7);
        store.write(path, "labelmap", labels.view().into_dyn()).unwrap();

        let holder = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _guard = holder.datasets.lock().unwrap();
            panic!("panicked while holding the store lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.datasets.is_poisoned());

        // Queries and reads agree with each other after poisoning
        assert_eq!(store.len(), 1);
        assert!(store.contains(path, "labelmap"));
        assert_eq!(store.read_labelmap(path, "labelmap").unwrap(), labels);
        store
            .write(path, "dataset", Array3::<f32>::zeros((1, 1, 1)).view().into_dyn())
            .unwrap();
        assert_eq!(store.len(), 2);
    }
}
