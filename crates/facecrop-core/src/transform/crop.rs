//! Pixel-rectangle cropping.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner
//! - `left`/`top` are inclusive, `right`/`bottom` exclusive
//! - Rectangles are clamped to the image, so a crop never reads outside it

use crate::decode::DecodedImage;

/// Axis-aligned crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    /// Square of side `size` centered on `(cx, cy)`, clamped to a
    /// `width x height` image.
    ///
    /// Edges are truncated toward zero before clamping, so fractional
    /// centers shift the square by less than one pixel.
    pub fn centered_square(cx: f64, cy: f64, size: f64, width: u32, height: u32) -> Self {
        let half = size / 2.0;
        let clamp = |v: f64, max: u32| -> u32 {
            let v = v.trunc();
            if v <= 0.0 {
                0
            } else if v >= max as f64 {
                max
            } else {
                v as u32
            }
        };
        CropRect {
            left: clamp(cx - half, width),
            top: clamp(cy - half, height),
            right: clamp(cx + half, width),
            bottom: clamp(cy + half, height),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Copy the pixels inside `rect`, after clamping it to the image bounds.
///
/// An empty or fully outside rectangle yields a zero-sized image.
pub fn crop_rect(image: &DecodedImage, rect: CropRect) -> DecodedImage {
    let left = rect.left.min(image.width);
    let top = rect.top.min(image.height);
    let right = rect.right.clamp(left, image.width);
    let bottom = rect.bottom.clamp(top, image.height);

    if left == 0 && top == 0 && right == image.width && bottom == image.height {
        return image.clone();
    }

    image.sub_image(left, top, right - left, bottom - top)
}
