//! Landmark geometry: typed points, 68-point landmark sets, and the
//! similarity transform that levels the eyes and frames the face.

mod analyze;
mod landmarks;
mod point;

pub use analyze::{FaceAnchors, LandmarkGeometry, SimilarityTransform, DEFAULT_FRONTALITY_THRESHOLD};
pub use landmarks::{landmark_index, BoundingBox, LandmarkError, LandmarkSet, LANDMARK_COUNT};
pub use point::{CanvasSpace, Point, RawSpace, Vector2};
