//! Pipeline configuration loaded from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use tomo_detect_clustering::ClusterConfig;
use tomo_detect_common::{ProcessingError, Result};
use tomo_detect_segmentation::TilingConfig;

/// Dataset and file names used when running against a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Input tomogram dataset
    pub volume_dataset: String,
    pub labelmap_dataset: String,
    /// Score map dataset, written only when set
    pub scoremap_dataset: Option<String>,
    /// Object list file, relative to the output container
    pub objects_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            volume_dataset: "dataset".to_string(),
            labelmap_dataset: "labelmap".to_string(),
            scoremap_dataset: None,
            objects_file: "objects.json".to_string(),
        }
    }
}

/// Full detection pipeline configuration
///
/// ```yaml
/// num_classes: 4
/// tiled: true
/// tiling:
///   patch_size: 160
///   crop_margin: 20
///   overlap: 45
/// clustering:
///   cluster_radius: 8.0
///   size_threshold: 50
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of classes including background
    pub num_classes: usize,
    pub tiling: TilingConfig,
    pub clustering: ClusterConfig,
    /// Tiled inference when true, single-block inference otherwise
    pub tiled: bool,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_classes: 2,
            tiling: TilingConfig::default(),
            clustering: ClusterConfig::default(),
            tiled: true,
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a YAML document
    ///
    /// # Errors
    /// Returns [`ProcessingError::Configuration`] on malformed YAML or invalid values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ProcessingError::Configuration(format!("Failed to parse YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ProcessingError::IoError`] when the file cannot be read, and
    /// [`ProcessingError::Configuration`] when its content is invalid.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// # Errors
    /// Returns [`ProcessingError::Configuration`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(ProcessingError::Configuration(
                "num_classes must be at least 1".to_string(),
            ));
        }
        if self.num_classes > usize::from(u16::MAX) + 1 {
            return Err(ProcessingError::Configuration(format!(
                "num_classes {} exceeds the label range",
                self.num_classes
            )));
        }
        self.tiling.validate()?;
        self.clustering.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.num_classes, 2);
        assert!(config.tiled);
        assert_eq!(config.tiling, TilingConfig::default());
        assert_eq!(config.output.volume_dataset, "dataset");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = PipelineConfig::from_yaml_str(
            "num_classes: 4\nclustering:\n  cluster_radius: 8.0\n",
        )
        .unwrap();
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.clustering.cluster_radius, 8.0);
        assert_eq!(config.clustering.size_threshold, 1);
        assert_eq!(config.tiling, TilingConfig::default());
        assert!(config.output.scoremap_dataset.is_none());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
num_classes: 3
tiled: false
tiling:
  patch_size: 64
  crop_margin: 8
  overlap: 21
clustering:
  cluster_radius: 4.5
  size_threshold: 30
output:
  scoremap_dataset: scores
  objects_file: found.json
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.tiled);
        assert_eq!(config.tiling.patch_size, 64);
        assert_eq!(config.tiling.overlap, 21);
        assert_eq!(config.clustering.size_threshold, 30);
        assert_eq!(config.output.scoremap_dataset.as_deref(), Some("scores"));
        assert_eq!(config.output.labelmap_dataset, "labelmap");
        assert_eq!(config.output.objects_file, "found.json");
    }

    #[test]
    fn test_invalid_values() {
        for yaml in [
            "num_classes: 0",
            "tiling:\n  patch_size: 30",
            "clustering:\n  cluster_radius: -1.0",
            "num_classes: [1, 2]",
        ] {
            let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
            assert!(
                matches!(err, ProcessingError::Configuration(_)),
                "{yaml:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "num_classes: 5\n").unwrap();
        assert_eq!(PipelineConfig::from_yaml_file(&path).unwrap().num_classes, 5);

        let err = PipelineConfig::from_yaml_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ProcessingError::IoError(_)));
    }
}
