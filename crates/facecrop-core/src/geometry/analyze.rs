//! Eye/mouth anchors, the frontality gate, and the alignment transform.
//!
//! All quantities are computed in the coordinate space of the landmarks
//! they come from; the space marker is carried through to the result.
//!
//! ```text
//! e0 = mid(36, 39)   e1 = mid(42, 45)   m0 = 48   m1 = 54   nose = 30
//! x_vec  = e1 - e0
//! y_vec  = mid(e0, e1) - mid(m0, m1)
//! center = mid(e0, e1) - 0.1 * y_vec
//! size   = max(4 * |x_vec|_1, 3.6 * |y_vec|_1)
//! angle  = -atan2(x_vec.y, x_vec.x)
//! ```

use log::debug;

use super::landmarks::{landmark_index as idx, LandmarkSet};
use super::point::{Point, Vector2};
use crate::reject::RejectReason;

/// Largest accepted ratio between the nose-to-eye horizontal distances.
pub const DEFAULT_FRONTALITY_THRESHOLD: f64 = 3.0;

/// Crop side as a multiple of the eye-line L1 length.
const EYE_SPAN_SCALE: f64 = 4.0;
/// Crop side as a multiple of the eye-to-mouth L1 length.
const EYE_MOUTH_SCALE: f64 = 3.6;
/// Fraction of the eye-to-mouth vector the anchor moves toward the forehead.
const ANCHOR_LIFT: f64 = 0.1;

/// The landmark-derived points the transform is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAnchors<S> {
    /// Midpoint of the subject's right eye corners (36, 39).
    pub right_eye: Point<S>,
    /// Midpoint of the subject's left eye corners (42, 45).
    pub left_eye: Point<S>,
    /// Subject's right mouth corner (48).
    pub mouth_right: Point<S>,
    /// Subject's left mouth corner (54).
    pub mouth_left: Point<S>,
    /// Nose tip (30).
    pub nose: Point<S>,
}

impl<S> FaceAnchors<S> {
    pub fn from_landmarks(landmarks: &LandmarkSet<S>) -> Self {
        Self {
            right_eye: landmarks
                .get(idx::RIGHT_EYE_OUTER)
                .midpoint(landmarks.get(idx::RIGHT_EYE_INNER)),
            left_eye: landmarks
                .get(idx::LEFT_EYE_INNER)
                .midpoint(landmarks.get(idx::LEFT_EYE_OUTER)),
            mouth_right: landmarks.get(idx::MOUTH_RIGHT),
            mouth_left: landmarks.get(idx::MOUTH_LEFT),
            nose: landmarks.get(idx::NOSE_TIP),
        }
    }

    /// Ratio of the larger to the smaller horizontal nose-to-eye distance.
    ///
    /// 1.0 for a perfectly frontal face, growing with yaw. A zero distance
    /// on either side gives infinity.
    pub fn frontality_score(&self) -> f64 {
        let right = (self.nose.x - self.right_eye.x).abs();
        let left = (self.left_eye.x - self.nose.x).abs();
        let (lo, hi) = if left < right { (left, right) } else { (right, left) };
        if lo > 0.0 {
            hi / lo
        } else {
            f64::INFINITY
        }
    }

    /// Eye-line vector, right eye to left eye.
    pub fn eye_vector(&self) -> Vector2 {
        self.left_eye - self.right_eye
    }

    /// From the mouth midpoint up to the eye midpoint.
    pub fn eye_to_mouth_vector(&self) -> Vector2 {
        self.eye_center() - self.mouth_right.midpoint(self.mouth_left)
    }

    pub fn eye_center(&self) -> Point<S> {
        self.right_eye.midpoint(self.left_eye)
    }
}

/// Square crop before rotation: centered on `center`, side `size`, to be
/// leveled by rotating the image by `rotation` radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform<S> {
    pub center: Point<S>,
    /// Radians; the sign follows an image rotation that makes the eye line
    /// horizontal.
    pub rotation: f64,
    /// Full side length of the square crop.
    pub size: f64,
}

impl<S> SimilarityTransform<S> {
    pub fn half_size(&self) -> f64 {
        self.size / 2.0
    }

    /// Rotation converted to an image rotation angle in degrees,
    /// counter-clockwise positive.
    pub fn image_rotation_degrees(&self) -> f64 {
        -self.rotation.to_degrees()
    }
}

/// Turns a landmark set into a [`SimilarityTransform`], rejecting faces
/// that are turned too far away from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkGeometry {
    threshold: f64,
}

impl Default for LandmarkGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTALITY_THRESHOLD)
    }
}

impl LandmarkGeometry {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn analyze<S>(
        &self,
        landmarks: &LandmarkSet<S>,
    ) -> Result<SimilarityTransform<S>, RejectReason> {
        let anchors = FaceAnchors::from_landmarks(landmarks);

        let score = anchors.frontality_score();
        if score.is_nan() || score > self.threshold {
            return Err(RejectReason::NotFrontal {
                score,
                threshold: self.threshold,
            });
        }

        let x_vec = anchors.eye_vector();
        let y_vec = anchors.eye_to_mouth_vector();
        let center = anchors.eye_center() - y_vec * ANCHOR_LIFT;
        let size = (EYE_SPAN_SCALE * x_vec.l1_norm()).max(EYE_MOUTH_SCALE * y_vec.l1_norm());
        let rotation = -x_vec.angle();

        debug!(
            "landmark geometry: score={score:.3} center={center:?} size={size:.1} rotation={:.3}deg",
            rotation.to_degrees()
        );

        Ok(SimilarityTransform {
            center,
            rotation,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::landmarks::LANDMARK_COUNT;
    use super::super::point::RawSpace;
    use super::*;

    /// Landmarks with only the anchor indices set; the rest sit at the nose.
    fn face(
        right_eye: (f64, f64),
        left_eye: (f64, f64),
        nose: (f64, f64),
        mouth_right: (f64, f64),
        mouth_left: (f64, f64),
    ) -> LandmarkSet<RawSpace> {
        let mut coords = vec![nose; LANDMARK_COUNT];
        coords[idx::RIGHT_EYE_OUTER] = (right_eye.0 - 5.0, right_eye.1);
        coords[idx::RIGHT_EYE_INNER] = (right_eye.0 + 5.0, right_eye.1);
        coords[idx::LEFT_EYE_INNER] = (left_eye.0 - 5.0, left_eye.1);
        coords[idx::LEFT_EYE_OUTER] = (left_eye.0 + 5.0, left_eye.1);
        coords[idx::MOUTH_RIGHT] = mouth_right;
        coords[idx::MOUTH_LEFT] = mouth_left;
        LandmarkSet::from_xy(&coords).unwrap()
    }

    fn level_face() -> LandmarkSet<RawSpace> {
        face(
            (220.0, 180.0),
            (280.0, 180.0),
            (250.0, 210.0),
            (230.0, 240.0),
            (270.0, 240.0),
        )
    }

    #[test]
    fn test_anchors() {
        let anchors = FaceAnchors::from_landmarks(&level_face());
        assert_eq!(anchors.right_eye, Point::new(220.0, 180.0));
        assert_eq!(anchors.left_eye, Point::new(280.0, 180.0));
        assert_eq!(anchors.eye_vector(), Vector2::new(60.0, 0.0));
        assert_eq!(anchors.eye_to_mouth_vector(), Vector2::new(0.0, -60.0));
    }

    #[test]
    fn test_symmetric_face_scores_one() {
        let anchors = FaceAnchors::from_landmarks(&level_face());
        assert_eq!(anchors.frontality_score(), 1.0);

        // Accepted even at the tightest possible threshold.
        assert!(LandmarkGeometry::new(1.0).analyze(&level_face()).is_ok());
    }

    #[test]
    fn test_ten_to_one_is_rejected() {
        // right_dist = 10, left_dist = 1
        let lm = face(
            (240.0, 180.0),
            (251.0, 180.0),
            (250.0, 210.0),
            (230.0, 240.0),
            (270.0, 240.0),
        );
        let anchors = FaceAnchors::from_landmarks(&lm);
        assert_eq!(anchors.frontality_score(), 10.0);

        let result = LandmarkGeometry::new(3.0).analyze(&lm);
        assert_eq!(
            result.unwrap_err(),
            RejectReason::NotFrontal {
                score: 10.0,
                threshold: 3.0
            }
        );
    }

    #[test]
    fn test_nose_on_eye_is_rejected() {
        let lm = face(
            (250.0, 180.0),
            (280.0, 180.0),
            (250.0, 210.0),
            (230.0, 240.0),
            (270.0, 240.0),
        );
        assert!(matches!(
            LandmarkGeometry::default().analyze(&lm),
            Err(RejectReason::NotFrontal { .. })
        ));
    }

    #[test]
    fn test_level_face_transform() {
        let t = LandmarkGeometry::default().analyze(&level_face()).unwrap();

        assert_eq!(t.center, Point::new(250.0, 186.0));
        // max(4 * 60, 3.6 * 60)
        assert_eq!(t.size, 240.0);
        assert_eq!(t.half_size(), 120.0);
        assert_eq!(t.rotation, 0.0);
    }

    #[test]
    fn test_mouth_span_dominates_size() {
        // Narrow eyes, long face: 3.6 * 100 > 4 * 40.
        let lm = face(
            (230.0, 100.0),
            (270.0, 100.0),
            (250.0, 150.0),
            (240.0, 200.0),
            (260.0, 200.0),
        );
        let t = LandmarkGeometry::default().analyze(&lm).unwrap();
        assert!((t.size - 360.0).abs() < 1e-9);
        assert!((t.center.y - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_tilted_face_rotation_sign() {
        // Left eye lower in the photo (y down): eye line at +45 degrees.
        let lm = face(
            (200.0, 200.0),
            (260.0, 260.0),
            (225.0, 260.0),
            (180.0, 300.0),
            (220.0, 340.0),
        );
        let t = LandmarkGeometry::new(10.0).analyze(&lm).unwrap();

        assert!((t.rotation + std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((t.image_rotation_degrees() - 45.0).abs() < 1e-9);
    }
}
