//! Batch and alignment settings.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::{FaceAligner, LandmarkOffset};
use crate::geometry::{LandmarkGeometry, DEFAULT_FRONTALITY_THRESHOLD};
use crate::locate::DEFAULT_DETECTION_LONG_SIDE;

pub const DEFAULT_IMAGE_SIZE: u32 = 1024;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image_size must be positive")]
    ZeroImageSize,

    #[error("detection_long_side must be positive")]
    ZeroDetectionSide,

    #[error("jpeg_quality must be in 1..=100, got {0}")]
    InvalidQuality(u8),

    #[error("frontality_threshold must be a finite number >= 1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("workers must be positive")]
    ZeroWorkers,
}

/// Alignment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Largest accepted nose-to-eye distance ratio.
    pub frontality_threshold: f64,
    pub landmark_offset: LandmarkOffset,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            frontality_threshold: DEFAULT_FRONTALITY_THRESHOLD,
            landmark_offset: LandmarkOffset::default(),
        }
    }
}

impl AlignConfig {
    pub fn aligner(&self) -> FaceAligner {
        FaceAligner::new(LandmarkGeometry::new(self.frontality_threshold))
            .with_offset(self.landmark_offset)
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Side of the square output images.
    pub image_size: u32,
    /// Long side of the copy the face detector runs on.
    pub detection_long_side: u32,
    pub jpeg_quality: u8,
    /// Worker threads; `None` uses one per CPU.
    pub workers: Option<usize>,
    pub align: AlignConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            detection_long_side: DEFAULT_DETECTION_LONG_SIDE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            workers: None,
            align: AlignConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_size == 0 {
            return Err(ConfigError::ZeroImageSize);
        }
        if self.detection_long_side == 0 {
            return Err(ConfigError::ZeroDetectionSide);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        let threshold = self.align.frontality_threshold;
        if !threshold.is_finite() || threshold < 1.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.image_size, 1024);
        assert_eq!(config.detection_long_side, 1000);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.workers, None);
        assert_eq!(config.align.frontality_threshold, 3.0);
        assert_eq!(config.align.landmark_offset, LandmarkOffset::Stride);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BatchConfig =
            serde_json::from_str(r#"{"image_size": 256, "align": {"landmark_offset": "canvas-center"}}"#)
                .unwrap();
        assert_eq!(config.image_size, 256);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.align.frontality_threshold, 3.0);
        assert_eq!(config.align.landmark_offset, LandmarkOffset::CanvasCenter);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facecrop.json");
        fs::write(&path, r#"{"workers": 2, "align": {"frontality_threshold": 2.5}}"#).unwrap();

        let config = BatchConfig::from_json_file(&path).unwrap();
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.align.frontality_threshold, 2.5);
        assert_eq!(config.align.aligner().geometry().threshold(), 2.5);
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            BatchConfig::from_json_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ image_size: }").unwrap();
        assert!(matches!(
            BatchConfig::from_json_file(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BatchConfig::default();
        config.image_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroImageSize)));

        let mut config = BatchConfig::default();
        config.detection_long_side = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDetectionSide)));

        let mut config = BatchConfig::default();
        config.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidQuality(0))));

        let mut config = BatchConfig::default();
        config.align.frontality_threshold = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));

        config.align.frontality_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));

        let mut config = BatchConfig::default();
        config.workers = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWorkers)));
    }
}
