//! Object list persistence as JSON

use crate::StorageResult;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tomo_detect_common::ObjectList;
use tracing::info;

/// Write `objects` as a JSON array, creating parent directories
///
/// # Errors
/// Returns an error when the file cannot be created or written.
pub fn write_object_list(path: &Path, objects: &ObjectList) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, objects)?;
    writer.flush()?;
    info!("Wrote {} objects to {}", objects.len(), path.display());
    Ok(())
}

/// # Errors
/// Returns an error when the file is missing or is not a valid object list.
pub fn read_object_list(path: &Path) -> StorageResult<ObjectList> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;
    use tomo_detect_common::ObjectRecord;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("objects.json");

        let mut tagged = ObjectRecord::from_axis_centroid(3, [4.0, 5.0, 6.0], 8);
        tagged.tomo_idx = Some(2);
        let mut objects: ObjectList = vec![
            ObjectRecord::from_axis_centroid(1, [10.0, 20.0, 30.5], 120),
            tagged,
        ]
        .into();
        objects.assign_ids();

        write_object_list(&path, &objects).unwrap();
        let back = read_object_list(&path).unwrap();
        assert_eq!(back, objects);
        assert_eq!(back.as_slice()[0].x, 30.5);
        assert_eq!(back.as_slice()[1].tomo_idx, Some(2));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_object_list(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, StorageError::IoError(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(matches!(
            read_object_list(&path).unwrap_err(),
            StorageError::SerializationError(_)
        ));
    }
}
