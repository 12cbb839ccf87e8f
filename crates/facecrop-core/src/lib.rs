//! Facecrop Core - face alignment for photo datasets
//!
//! Turns portrait photographs into leveled, face-centered squares of a fixed
//! size:
//!
//! 1. [`padding`] surrounds the photo with blurred mirror tiles so the crop
//!    can be rotated freely without running off the image.
//! 2. [`locate`] finds the 68 facial landmarks through pluggable detector
//!    and predictor models, or reads them from JSON sidecar files.
//! 3. [`geometry`] gates on frontality and derives the crop square.
//! 4. [`align`] rotates the padded canvas and cuts the square out.
//! 5. [`batch`] runs the above over a directory in parallel.

pub mod align;
pub mod batch;
pub mod config;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod locate;
pub mod padding;
pub mod reject;
pub mod transform;

pub use align::{FaceAligner, FaceNormalizer, LandmarkOffset};
pub use batch::{BatchError, BatchPipeline, BatchReport, ImageOutcome};
pub use config::{AlignConfig, BatchConfig, ConfigError};
pub use decode::{DecodeError, DecodedImage};
pub use encode::EncodeError;
pub use geometry::{
    BoundingBox, CanvasSpace, LandmarkGeometry, LandmarkSet, Point, RawSpace, SimilarityTransform,
};
pub use locate::{
    FaceDetector, LandmarkPredictor, LandmarkSource, ModelError, ModelLandmarkSource,
    SidecarLandmarkSource,
};
pub use padding::{mirror_pad, PaddedCanvas};
pub use reject::RejectReason;
