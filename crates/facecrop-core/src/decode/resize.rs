//! Image resizing for detector input and final output.
//!
//! Wraps the `image` crate's resamplers. All functions return new
//! `DecodedImage` instances without modifying the input.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for a zero target dimension, and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// declared size.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbImage".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Rescale an image so that its long side equals `long_side`.
///
/// Unlike a fit-within resize this also upscales small inputs, so the
/// detector always sees faces at a comparable scale. Returns the resized
/// image together with the ratio `original / resized`, which maps
/// coordinates found on the resized copy back onto the original.
pub fn resize_long_side(
    image: &DecodedImage,
    long_side: u32,
    filter: FilterType,
) -> Result<(DecodedImage, f64), DecodeError> {
    if long_side == 0 || image.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let ratio = image.width.max(image.height) as f64 / long_side as f64;
    let (width, height) = scaled_dimensions(image.width, image.height, ratio);
    let resized = resize(image, width, height, filter)?;
    Ok((resized, ratio))
}

/// Dimensions after dividing by `ratio`, truncated and never below one pixel.
fn scaled_dimensions(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    let w = (width as f64 / ratio) as u32;
    let h = (height as f64 / ratio) as u32;
    (w.max(1), h.max(1))
}
