//! Same-size image rotation about the image center.
//!
//! The output keeps the input dimensions; corners rotated in from outside
//! the source read as black. Callers that cannot afford black corners pad
//! the image first (see [`crate::padding`]).
//!
//! # Algorithm
//!
//! Inverse mapping: for every destination pixel we find the source
//! position it came from and sample it bilinearly. For a rotation by θ
//! (counter-clockwise on screen, y axis pointing down) about `(cx, cy)`:
//! ```text
//! src_x =  (dst_x - cx) * cos(θ) - (dst_y - cy) * sin(θ) + cx
//! src_y =  (dst_x - cx) * sin(θ) + (dst_y - cy) * cos(θ) + cy
//! ```
//! The forward map of the same rotation is
//! [`rotate_point_about`], which carries landmark anchors into the
//! rotated image.

use crate::decode::DecodedImage;

/// Angles below this magnitude (in degrees) are treated as no rotation.
const IDENTITY_EPSILON_DEGREES: f64 = 1e-9;

/// Rotate an image about `(width / 2, height / 2)` keeping its size.
///
/// # Arguments
///
/// * `image` - Source image
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
///
/// A zero angle returns an exact copy, so unrotated content is never
/// resampled.
pub fn rotate_about_center(image: &DecodedImage, angle_degrees: f64) -> DecodedImage {
    if angle_degrees.abs() < IDENTITY_EPSILON_DEGREES || image.is_empty() {
        return image.clone();
    }

    let cx = image.width as f64 / 2.0;
    let cy = image.height as f64 / 2.0;
    let theta = angle_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let mut output = vec![0u8; image.pixels.len()];
    let stride = image.row_stride();

    for (dst_y, row) in output.chunks_exact_mut(stride).enumerate() {
        let dy = dst_y as f64 - cy;
        for (dst_x, px) in row.chunks_exact_mut(3).enumerate() {
            let dx = dst_x as f64 - cx;
            let src_x = dx * cos - dy * sin + cx;
            let src_y = dx * sin + dy * cos + cy;
            px.copy_from_slice(&sample_bilinear(image, src_x, src_y));
        }
    }

    DecodedImage::new(image.width, image.height, output)
}

/// Rotate a point about `center` by `angle_radians`, in the same sense as
/// [`rotate_about_center`] when the angle is given in degrees.
///
/// Image content at `point` before rotation lands at the returned position.
#[inline]
pub fn rotate_point_about(point: (f64, f64), center: (f64, f64), angle_radians: f64) -> (f64, f64) {
    let (sin, cos) = angle_radians.sin_cos();
    let dx = point.0 - center.0;
    let dy = point.1 - center.1;
    (
        dx * cos + dy * sin + center.0,
        -dx * sin + dy * cos + center.1,
    )
}

/// Sample a pixel using bilinear interpolation.
///
/// Each of the four neighbours outside the image contributes black, so
/// the image fades out over one pixel at its border instead of being cut.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (image.width as i64, image.height as i64);

    let x0f = x.floor();
    let y0f = y.floor();
    let fx = x - x0f;
    let fy = y - y0f;
    let x0 = x0f as i64;
    let y0 = y0f as i64;

    if x0 < -1 || y0 < -1 || x0 >= w || y0 >= h {
        return [0, 0, 0];
    }

    let fetch = |px: i64, py: i64| -> [f64; 3] {
        if px < 0 || py < 0 || px >= w || py >= h {
            return [0.0; 3];
        }
        let p = image.pixel(px as u32, py as u32);
        [p[0] as f64, p[1] as f64, p[2] as f64]
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}
