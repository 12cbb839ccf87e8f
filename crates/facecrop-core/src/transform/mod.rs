//! Pixel-level image transforms used by the alignment pipeline.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y grows downward
//! - Rotation angles are in degrees, positive = counter-clockwise on screen
//! - Rotation is about `(width / 2, height / 2)` and keeps the image size
//! - Crop rectangles are integer pixel coordinates, right/bottom exclusive

mod blur;
mod crop;
mod rotation;

pub use blur::box_blur;
pub use crop::{crop_rect, CropRect};
pub use rotation::{rotate_about_center, rotate_point_about};
