//! Clustering configuration

use crate::ClusterError;
use serde::{Deserialize, Serialize};

/// Configuration for object extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Mean-shift bandwidth: expected object radius, in voxels
    pub cluster_radius: f64,
    /// Minimum cluster size (in voxels) for an object to be kept by callers
    /// that filter false positives. The extractor itself reports every cluster.
    pub size_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_radius: 5.0,
            size_threshold: 1,
        }
    }
}

impl ClusterConfig {
    /// Config with the given radius and the default size threshold
    #[must_use]
    pub fn with_radius(cluster_radius: f64) -> Self {
        Self {
            cluster_radius,
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns [`ClusterError::InvalidConfig`] unless the radius is finite and positive.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !self.cluster_radius.is_finite() || self.cluster_radius <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "cluster radius must be positive, got {}",
                self.cluster_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.cluster_radius, 5.0);
        assert_eq!(config.size_threshold, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_radius() {
        for radius in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(
                ClusterConfig::with_radius(radius).validate().is_err(),
                "radius {radius} accepted"
            );
        }
    }

    #[test]
    fn test_deserialize() {
        let config: ClusterConfig =
            serde_json::from_str(r#"{"cluster_radius": 12.5, "size_threshold": 40}"#).unwrap();
        assert_eq!(config.cluster_radius, 12.5);
        assert_eq!(config.size_threshold, 40);

        let config: ClusterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClusterConfig::default());
    }
}
