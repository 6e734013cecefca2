//! Integration tests for tomogram persistence

use ndarray::{Array3, Array4};
use tomo_detect_common::{ObjectList, ObjectRecord, ProcessingError};
use tomo_detect_storage::{read_object_list, write_object_list, ArrayStore, DirectoryStore, MemoryStore};

fn sample_volume() -> Array3<f32> {
    Array3::from_shape_fn((6, 7, 8), |(z, y, x)| ((z * 7 + y) * 8 + x) as f32 * 0.25 - 10.0)
}

/// Both stores must behave identically for the same sequence of operations
fn exercise_store<S: ArrayStore>(store: &S, container: &std::path::Path) {
    let volume = sample_volume();
    store.write(container, "dataset", volume.view().into_dyn()).unwrap();

    let labelmap = volume.mapv(|v| if v > 0.0 { 2u16 } else { 0 });
    store.write(container, "labelmap", labelmap.view().into_dyn()).unwrap();

    let scores = Array4::<f32>::from_elem((6, 7, 8, 3), 1.0 / 3.0);
    store.write(container, "scoremap", scores.view().into_dyn()).unwrap();

    assert_eq!(store.read_volume(container, "dataset").unwrap(), volume);
    assert_eq!(store.read_labelmap(container, "labelmap").unwrap(), labelmap);
    assert_eq!(store.read::<f32>(container, "scoremap").unwrap().shape(), &[6, 7, 8, 3]);

    // A 4D dataset is not a volume
    assert!(store.read_volume(container, "scoremap").is_err());
    // Labelmaps are not floats
    assert!(store.read_volume(container, "labelmap").is_err());
}

#[test]
fn test_memory_store() {
    exercise_store(&MemoryStore::new(), std::path::Path::new("tomo_0"));
}

#[test]
fn test_directory_store() {
    let dir = tempfile::tempdir().unwrap();
    exercise_store(&DirectoryStore::new(), &dir.path().join("tomo_0"));
}

#[test]
fn test_object_list_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objects.json");
    let objects: ObjectList = (0..5)
        .map(|i| ObjectRecord::from_axis_centroid(1 + i as u16 % 2, [i as f64, 2.0, 3.0], 10 * i))
        .collect();

    write_object_list(&path, &objects).unwrap();
    let back = read_object_list(&path).unwrap();
    assert_eq!(back.len(), 5);
    assert_eq!(back.with_label(1).len(), 3);
    assert_eq!(back.above_size_threshold(20).len(), 3);
}

#[test]
fn test_errors_convert_to_processing_error() {
    let dir = tempfile::tempdir().unwrap();
    let err: ProcessingError = DirectoryStore::new()
        .read_volume(dir.path(), "missing")
        .unwrap_err()
        .into();
    assert!(matches!(err, ProcessingError::Storage(_)));

    let err: ProcessingError = read_object_list(&dir.path().join("missing.json"))
        .unwrap_err()
        .into();
    assert!(matches!(err, ProcessingError::IoError(_)));
}
