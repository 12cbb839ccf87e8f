//! Points tagged with the image they belong to.
//!
//! Landmarks come back from the predictor in the coordinates of the raw
//! photograph, while cropping happens on the padded canvas. The marker
//! parameter keeps the two apart at compile time. Raw landmarks only reach
//! the canvas through [`crate::padding::PaddedCanvas::to_canvas`] or
//! [`crate::padding::PaddedCanvas::to_canvas_centered`].

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Sub};

/// Coordinates of the unpadded source photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSpace {}

/// Coordinates of the mirror-padded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasSpace {}

/// A 2D point in the pixel coordinates of image space `S`.
pub struct Point<S> {
    pub x: f64,
    pub y: f64,
    space: PhantomData<S>,
}

impl<S> Point<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// Midpoint of the segment `self`–`other`.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// Manual impls: derives would needlessly bound the marker type.
impl<S> Clone for Point<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Point<S> {}

impl<S> PartialEq for Point<S> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<S> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Displacement between two points of the same space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan length `|x| + |y|`.
    pub fn l1_norm(&self) -> f64 {
        self.x.abs() + self.y.abs()
    }

    /// Angle of the vector measured from the +x axis, in radians.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl<S> Sub for Point<S> {
    type Output = Vector2;

    fn sub(self, rhs: Self) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<S> Add<Vector2> for Point<S> {
    type Output = Point<S>;

    fn add(self, rhs: Vector2) -> Point<S> {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<S> Sub<Vector2> for Point<S> {
    type Output = Point<S>;

    fn sub(self, rhs: Vector2) -> Point<S> {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}
