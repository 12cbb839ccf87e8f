//! 68-point facial landmark sets and detector bounding boxes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::point::{CanvasSpace, Point, RawSpace};

/// Number of points in the iBUG 300-W landmark layout.
pub const LANDMARK_COUNT: usize = 68;

/// Indices into the 68-point layout. "Right" and "left" are the subject's,
/// so the right eye appears on the left of the photograph.
pub mod landmark_index {
    pub const NOSE_TIP: usize = 30;
    pub const RIGHT_EYE_OUTER: usize = 36;
    pub const RIGHT_EYE_INNER: usize = 39;
    pub const LEFT_EYE_INNER: usize = 42;
    pub const LEFT_EYE_OUTER: usize = 45;
    pub const MOUTH_RIGHT: usize = 48;
    pub const MOUTH_LEFT: usize = 54;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("expected 68 landmarks, got {0}")]
    WrongCount(usize),

    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Exactly 68 ordered landmarks in image space `S`.
///
/// The order is the anatomical index and is never changed.
#[derive(Clone, PartialEq)]
pub struct LandmarkSet<S> {
    points: Box<[Point<S>; LANDMARK_COUNT]>,
}

impl<S> LandmarkSet<S> {
    /// Build a set from `(x, y)` pairs.
    pub fn from_xy(coords: &[(f64, f64)]) -> Result<Self, LandmarkError> {
        if coords.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount(coords.len()));
        }
        if let Some(i) = coords.iter().position(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(LandmarkError::NonFinite(i));
        }
        let points = std::array::from_fn(|i| Point::new(coords[i].0, coords[i].1));
        Ok(Self {
            points: Box::new(points),
        })
    }

    pub fn points(&self) -> &[Point<S>; LANDMARK_COUNT] {
        &self.points
    }

    #[inline]
    pub fn get(&self, index: usize) -> Point<S> {
        self.points[index]
    }

}

impl LandmarkSet<RawSpace> {
    /// Shift every point by `(dx, dy)` onto the padded canvas.
    pub(crate) fn shift_to_canvas(&self, dx: f64, dy: f64) -> LandmarkSet<CanvasSpace> {
        let points = std::array::from_fn(|i| {
            let p = self.points[i];
            Point::new(p.x + dx, p.y + dy)
        });
        LandmarkSet {
            points: Box::new(points),
        }
    }
}

impl<S> std::fmt::Debug for LandmarkSet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.points.iter()).finish()
    }
}

/// Face bounding box in integer pixel coordinates, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Whether the box has positive width and height.
    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Multiply every coordinate by `ratio`, truncating toward zero.
    ///
    /// Used to carry boxes found on a resized copy back to full resolution.
    pub fn scaled(&self, ratio: f64) -> Self {
        let s = |v: i32| (v as f64 * ratio) as i32;
        Self::new(s(self.left), s(self.top), s(self.right), s(self.bottom))
    }
}
