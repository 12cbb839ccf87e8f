//! Where landmarks come from.
//!
//! The face detector and the landmark predictor are external models; this
//! module defines the traits they plug in through and the policy around
//! them (detect on a down-scaled copy, insist on exactly one face, predict
//! at full resolution). Landmarks can also be read from JSON sidecar files
//! produced ahead of time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BatchConfig;
use crate::decode::{resize_long_side, DecodedImage, FilterType};
use crate::geometry::{BoundingBox, LandmarkError, LandmarkSet, RawSpace};
use crate::reject::RejectReason;

/// Long side of the copy the detector runs on.
pub const DEFAULT_DETECTION_LONG_SIDE: u32 = 1000;

/// Failure inside a detection or landmark model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid landmarks: {0}")]
    InvalidLandmarks(#[from] LandmarkError),

    #[error("model lock poisoned")]
    Poisoned,
}

/// Finds face bounding boxes.
pub trait FaceDetector {
    /// Every face found in `image`, in `image` coordinates.
    fn detect(&self, image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError>;
}

/// Places the 68 landmarks of one face.
pub trait LandmarkPredictor {
    fn predict(
        &self,
        image: &DecodedImage,
        face: BoundingBox,
    ) -> Result<LandmarkSet<RawSpace>, ModelError>;
}

// A model that is not thread-safe is shared behind a mutex.
impl<T: FaceDetector> FaceDetector for Mutex<T> {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError> {
        self.lock().map_err(|_| ModelError::Poisoned)?.detect(image)
    }
}

impl<T: LandmarkPredictor> LandmarkPredictor for Mutex<T> {
    fn predict(
        &self,
        image: &DecodedImage,
        face: BoundingBox,
    ) -> Result<LandmarkSet<RawSpace>, ModelError> {
        self.lock().map_err(|_| ModelError::Poisoned)?.predict(image, face)
    }
}

impl<T: FaceDetector + ?Sized> FaceDetector for Arc<T> {
    fn detect(&self, image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError> {
        (**self).detect(image)
    }
}

impl<T: LandmarkPredictor + ?Sized> LandmarkPredictor for Arc<T> {
    fn predict(
        &self,
        image: &DecodedImage,
        face: BoundingBox,
    ) -> Result<LandmarkSet<RawSpace>, ModelError> {
        (**self).predict(image, face)
    }
}

/// Produces the raw-space landmarks of the single face in an image.
///
/// Implementations are shared by every worker of a batch.
pub trait LandmarkSource: Send + Sync {
    /// Picks up batch settings before the first image. Does nothing by default.
    fn configure(&mut self, _config: &BatchConfig) {}

    fn locate(
        &self,
        path: &Path,
        image: &DecodedImage,
    ) -> Result<LandmarkSet<RawSpace>, RejectReason>;
}

/// Landmarks from a detector and a predictor.
#[derive(Debug)]
pub struct ModelLandmarkSource<D, P> {
    detector: D,
    predictor: P,
    long_side: u32,
}

impl<D, P> ModelLandmarkSource<D, P>
where
    D: FaceDetector + Send + Sync,
    P: LandmarkPredictor + Send + Sync,
{
    pub fn new(detector: D, predictor: P) -> Self {
        Self {
            detector,
            predictor,
            long_side: DEFAULT_DETECTION_LONG_SIDE,
        }
    }

    /// Long side of the detector input. Zero is treated as one pixel.
    pub fn with_long_side(mut self, long_side: u32) -> Self {
        self.long_side = long_side.max(1);
        self
    }

    pub fn long_side(&self) -> u32 {
        self.long_side
    }
}

impl<D, P> LandmarkSource for ModelLandmarkSource<D, P>
where
    D: FaceDetector + Send + Sync,
    P: LandmarkPredictor + Send + Sync,
{
    fn configure(&mut self, config: &BatchConfig) {
        self.long_side = config.detection_long_side.max(1);
    }

    fn locate(
        &self,
        path: &Path,
        image: &DecodedImage,
    ) -> Result<LandmarkSet<RawSpace>, RejectReason> {
        let (small, ratio) = resize_long_side(image, self.long_side, FilterType::Cubic)
            .map_err(|e| RejectReason::DetectionFailed(e.to_string()))?;

        let boxes = self
            .detector
            .detect(&small)
            .map_err(|e| RejectReason::DetectionFailed(e.to_string()))?;
        let face = match boxes.as_slice() {
            [only] => only.scaled(ratio),
            _ => return Err(RejectReason::NoUniqueFace { count: boxes.len() }),
        };
        if !face.is_valid() {
            return Err(RejectReason::DetectionFailed(format!(
                "empty face box {face:?}"
            )));
        }
        debug!("{}: face at {face:?} (detector scale {ratio:.3})", path.display());

        self.predictor
            .predict(image, face)
            .map_err(|e| RejectReason::DetectionFailed(e.to_string()))
    }
}

/// On-disk landmark file: `{"landmarks": [[x, y], ...]}` with 68 entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFile {
    pub landmarks: Vec<[f64; 2]>,
}

impl LandmarkFile {
    pub fn from_set(set: &LandmarkSet<RawSpace>) -> Self {
        Self {
            landmarks: set.points().iter().map(|p| [p.x, p.y]).collect(),
        }
    }

    pub fn to_set(&self) -> Result<LandmarkSet<RawSpace>, LandmarkError> {
        let coords: Vec<(f64, f64)> = self.landmarks.iter().map(|[x, y]| (*x, *y)).collect();
        LandmarkSet::from_xy(&coords)
    }
}

/// Landmarks read from `<dir>/<image file stem>.json`.
#[derive(Debug, Clone)]
pub struct SidecarLandmarkSource {
    dir: PathBuf,
}

impl SidecarLandmarkSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sidecar path for an image path.
    pub fn sidecar_path(&self, image_path: &Path) -> Option<PathBuf> {
        let stem = image_path.file_stem()?;
        let mut name = stem.to_os_string();
        name.push(".json");
        Some(self.dir.join(name))
    }
}

impl LandmarkSource for SidecarLandmarkSource {
    fn locate(
        &self,
        path: &Path,
        _image: &DecodedImage,
    ) -> Result<LandmarkSet<RawSpace>, RejectReason> {
        let sidecar = self.sidecar_path(path).ok_or_else(|| {
            RejectReason::DetectionFailed(format!("no file name in {}", path.display()))
        })?;

        let text = match fs::read_to_string(&sidecar) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RejectReason::NoUniqueFace { count: 0 });
            }
            Err(e) => {
                return Err(RejectReason::DetectionFailed(format!(
                    "{}: {e}",
                    sidecar.display()
                )));
            }
        };

        let file: LandmarkFile = serde_json::from_str(&text).map_err(|e| {
            RejectReason::DetectionFailed(format!("{}: {e}", sidecar.display()))
        })?;
        file.to_set().map_err(|e| {
            RejectReason::DetectionFailed(format!("{}: {e}", sidecar.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, LANDMARK_COUNT};

    struct Boxes(Vec<BoundingBox>);

    impl FaceDetector for Boxes {
        fn detect(&self, _image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl FaceDetector for Broken {
        fn detect(&self, _image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError> {
            Err(ModelError::Inference("out of memory".into()))
        }
    }

    /// Finds nothing and records the size of every image it was given.
    #[derive(Default)]
    struct Sizes {
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl FaceDetector for Sizes {
        fn detect(&self, image: &DecodedImage) -> Result<Vec<BoundingBox>, ModelError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((image.width, image.height));
            }
            Ok(vec![])
        }
    }

    struct FailingPredictor;

    impl LandmarkPredictor for FailingPredictor {
        fn predict(
            &self,
            _image: &DecodedImage,
            _face: BoundingBox,
        ) -> Result<LandmarkSet<RawSpace>, ModelError> {
            Err(ModelError::Inference("no convergence".into()))
        }
    }

    /// Places every landmark at the box center and records the box it saw.
    #[derive(Default)]
    struct BoxCenter {
        seen: Mutex<Vec<BoundingBox>>,
    }

    impl LandmarkPredictor for BoxCenter {
        fn predict(
            &self,
            _image: &DecodedImage,
            face: BoundingBox,
        ) -> Result<LandmarkSet<RawSpace>, ModelError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(face);
            }
            let c = (
                (face.left + face.right) as f64 / 2.0,
                (face.top + face.bottom) as f64 / 2.0,
            );
            Ok(LandmarkSet::from_xy(&vec![c; LANDMARK_COUNT])?)
        }
    }

    fn grid() -> Vec<(f64, f64)> {
        (0..LANDMARK_COUNT).map(|i| (i as f64, 100.0 - i as f64)).collect()
    }

    #[test]
    fn test_single_box_scaled_to_full_resolution() {
        // 2000 px long side -> detector sees 1000 px, ratio 2.
        let image = DecodedImage::filled(2000, 1000, [9, 9, 9]);
        let source = ModelLandmarkSource::new(
            Boxes(vec![BoundingBox::new(100, 50, 300, 250)]),
            BoxCenter::default(),
        );
        let set = source.locate(Path::new("x.jpg"), &image).unwrap();
        assert_eq!(set.get(0), Point::new(400.0, 300.0));

        let seen = source.predictor.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[BoundingBox::new(200, 100, 600, 500)]);
    }

    #[test]
    fn test_small_image_is_upscaled_for_detection() {
        let image = DecodedImage::filled(250, 100, [0, 0, 0]);
        let source = ModelLandmarkSource::new(
            Boxes(vec![BoundingBox::new(400, 100, 600, 300)]),
            BoxCenter::default(),
        );
        let set = source.locate(Path::new("x.jpg"), &image).unwrap();
        // ratio 0.25
        assert_eq!(set.get(30), Point::new(125.0, 50.0));
    }

    #[test]
    fn test_zero_or_many_faces_rejected() {
        let image = DecodedImage::filled(100, 100, [0, 0, 0]);
        let none = ModelLandmarkSource::new(Boxes(vec![]), BoxCenter::default());
        assert_eq!(
            none.locate(Path::new("x.jpg"), &image).unwrap_err(),
            RejectReason::NoUniqueFace { count: 0 }
        );

        let b = BoundingBox::new(0, 0, 10, 10);
        let two = ModelLandmarkSource::new(Boxes(vec![b, b]), BoxCenter::default());
        assert_eq!(
            two.locate(Path::new("x.jpg"), &image).unwrap_err(),
            RejectReason::NoUniqueFace { count: 2 }
        );
    }

    #[test]
    fn test_detector_error_is_detection_failed() {
        let image = DecodedImage::filled(100, 100, [0, 0, 0]);
        let source = ModelLandmarkSource::new(Broken, BoxCenter::default());
        let err = source.locate(Path::new("x.jpg"), &image).unwrap_err();
        assert_eq!(
            err,
            RejectReason::DetectionFailed("inference failed: out of memory".into())
        );
    }

    #[test]
    fn test_empty_scaled_box_is_detection_failed() {
        let image = DecodedImage::filled(100, 100, [0, 0, 0]);
        let source = ModelLandmarkSource::new(
            Boxes(vec![BoundingBox::new(10, 10, 10, 20)]),
            BoxCenter::default(),
        );
        let err = source.locate(Path::new("x.jpg"), &image).unwrap_err();
        assert_eq!(err.kind(), "detection-failed");
        assert!(err.to_string().contains("empty face box"));
        assert!(source.predictor.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_predictor_error_is_detection_failed() {
        let image = DecodedImage::filled(100, 100, [0, 0, 0]);
        let source = ModelLandmarkSource::new(
            Boxes(vec![BoundingBox::new(100, 100, 400, 400)]),
            FailingPredictor,
        );
        let err = source.locate(Path::new("x.jpg"), &image).unwrap_err();
        assert_eq!(
            err,
            RejectReason::DetectionFailed("inference failed: no convergence".into())
        );
    }

    #[test]
    fn test_configure_sets_detection_size() {
        let image = DecodedImage::filled(500, 400, [0, 0, 0]);
        let mut source = ModelLandmarkSource::new(Sizes::default(), BoxCenter::default());
        source.configure(&BatchConfig {
            detection_long_side: 250,
            ..BatchConfig::default()
        });
        assert_eq!(source.long_side(), 250);

        let _ = source.locate(Path::new("x.jpg"), &image);
        assert_eq!(source.detector.seen.lock().unwrap().as_slice(), &[(250, 200)]);
    }

    #[test]
    fn test_mutex_wrapped_models() {
        let image = DecodedImage::filled(1000, 500, [0, 0, 0]);
        let source = ModelLandmarkSource::new(
            Mutex::new(Boxes(vec![BoundingBox::new(10, 10, 20, 20)])),
            Arc::new(Mutex::new(BoxCenter::default())),
        )
        .with_long_side(500);
        assert_eq!(source.long_side(), 500);
        let set = source.locate(Path::new("x.jpg"), &image).unwrap();
        assert_eq!(set.get(0), Point::new(30.0, 30.0));
    }

    #[test]
    fn test_sidecar_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let set = LandmarkSet::<RawSpace>::from_xy(&grid()).unwrap();
        let json = serde_json::to_string(&LandmarkFile::from_set(&set)).unwrap();
        fs::write(dir.path().join("portrait.json"), json).unwrap();

        let source = SidecarLandmarkSource::new(dir.path());
        let image = DecodedImage::filled(4, 4, [0, 0, 0]);
        let loaded = source
            .locate(Path::new("/photos/portrait.jpg"), &image)
            .unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_sidecar_missing_means_no_face() {
        let dir = tempfile::tempdir().unwrap();
        let source = SidecarLandmarkSource::new(dir.path());
        let image = DecodedImage::filled(4, 4, [0, 0, 0]);
        assert_eq!(
            source.locate(Path::new("a.png"), &image).unwrap_err(),
            RejectReason::NoUniqueFace { count: 0 }
        );
    }

    #[test]
    fn test_sidecar_wrong_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"landmarks": [[1, 2], [3, 4]]}"#).unwrap();
        let source = SidecarLandmarkSource::new(dir.path());
        let image = DecodedImage::filled(4, 4, [0, 0, 0]);
        let err = source.locate(Path::new("a.png"), &image).unwrap_err();
        assert_eq!(err.kind(), "detection-failed");
        assert!(err.to_string().contains("expected 68 landmarks, got 2"));
    }

    #[test]
    fn test_sidecar_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "not json").unwrap();
        let source = SidecarLandmarkSource::new(dir.path());
        let image = DecodedImage::filled(4, 4, [0, 0, 0]);
        let err = source.locate(Path::new("a.png"), &image).unwrap_err();
        assert_eq!(err.kind(), "detection-failed");
    }
}
