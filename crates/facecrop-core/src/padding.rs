//! Mirror-tiled padding around a photograph.
//!
//! The aligned crop is rotated about the canvas center and may reach well
//! beyond the photo's edges. Instead of black borders the photo is
//! surrounded with mirrored and plain copies of itself, and everything
//! outside the original rectangle is box-blurred so the tile seams are not
//! visible.
//!
//! # Tiling
//!
//! Along one axis of length `len` with `r = hypot(h, w) / 2`:
//!
//! ```text
//! n      = ceil((r - len / 2) / len * 2) + 1      // tiling steps
//! step i = i % 4: 0 append flipped, 1 prepend flipped, 2 append, 3 prepend
//! total  = (n + 1) * len
//! n odd  -> roll the result by floor(len / 2) toward the end
//! stride = floor(n * len / 2)                     // where the photo starts
//! ```
//!
//! The vertical axis is tiled first; the horizontal axis then tiles the
//! vertically padded strip. Both steps only ever place whole source rows
//! or columns, so the canvas is described by one source-row index per
//! canvas row and one source-column index per canvas column.

use log::debug;

use crate::decode::DecodedImage;
use crate::geometry::{CanvasSpace, LandmarkSet, RawSpace};
use crate::reject::RejectReason;
use crate::transform::box_blur;

/// The blur kernel is the source's long side divided by this.
const BLUR_DIVISOR: u32 = 10;

/// A mirror-padded canvas with the unblurred source at `(stride_w, stride_h)`.
#[derive(Debug, Clone)]
pub struct PaddedCanvas {
    image: DecodedImage,
    stride_h: u32,
    stride_w: u32,
    source_width: u32,
    source_height: u32,
}

impl PaddedCanvas {
    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Row of the canvas where the source's first row sits.
    pub fn stride_h(&self) -> u32 {
        self.stride_h
    }

    /// Column of the canvas where the source's first column sits.
    pub fn stride_w(&self) -> u32 {
        self.stride_w
    }

    /// `(width, height)` of the padded source.
    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Offset `((W - w) / 2, (H - h) / 2)` of a source centered exactly in
    /// the canvas. Differs from the true stride by half a pixel when
    /// `tile_steps * len` is odd.
    pub fn centered_offset(&self) -> (f64, f64) {
        (
            (self.image.width - self.source_width) as f64 / 2.0,
            (self.image.height - self.source_height) as f64 / 2.0,
        )
    }

    /// Move raw-image landmarks onto the canvas using the true stride.
    pub fn to_canvas(&self, landmarks: &LandmarkSet<RawSpace>) -> LandmarkSet<CanvasSpace> {
        landmarks.shift_to_canvas(self.stride_w as f64, self.stride_h as f64)
    }

    /// Move raw-image landmarks onto the canvas by [`Self::centered_offset`].
    pub fn to_canvas_centered(&self, landmarks: &LandmarkSet<RawSpace>) -> LandmarkSet<CanvasSpace> {
        let (dx, dy) = self.centered_offset();
        landmarks.shift_to_canvas(dx, dy)
    }
}

/// Tiling of one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AxisTiling {
    /// Source index for every canvas index along the axis.
    map: Vec<u32>,
    /// Canvas index of source index 0.
    stride: u32,
}

impl AxisTiling {
    fn new(len: u32, half_diagonal: f64) -> Self {
        let len_f = len as f64;
        let residual = half_diagonal - len_f / 2.0;
        let steps = (residual / len_f * 2.0).ceil().max(0.0) as usize + 1;

        // Tile sequence; `true` marks a flipped copy.
        let mut tiles = std::collections::VecDeque::with_capacity(steps + 1);
        tiles.push_back(false);
        for i in 0..steps {
            match i % 4 {
                0 => tiles.push_back(true),
                1 => tiles.push_front(true),
                2 => tiles.push_back(false),
                _ => tiles.push_front(false),
            }
        }

        let total = tiles.len() * len as usize;
        let shift = if steps % 2 == 0 { 0 } else { len as usize / 2 };
        let map = (0..total)
            .map(|i| {
                let tiled = (i + total - shift) % total;
                let offset = (tiled % len as usize) as u32;
                if tiles[tiled / len as usize] {
                    len - 1 - offset
                } else {
                    offset
                }
            })
            .collect();

        Self {
            map,
            stride: (steps as f64 * len_f / 2.0) as u32,
        }
    }
}

/// Pad `source` onto a mirror-tiled, seam-blurred canvas.
///
/// The returned canvas is at least `hypot(h, w)` on each side, and its
/// `[stride_h, stride_h + h) x [stride_w, stride_w + w)` block is exactly
/// `source`.
///
/// # Errors
///
/// `RejectReason::DegenerateInput` for a zero-area source.
pub fn mirror_pad(source: &DecodedImage) -> Result<PaddedCanvas, RejectReason> {
    let (w, h) = (source.width, source.height);
    if source.is_empty() || source.pixels.len() != source.pixel_count() * DecodedImage::CHANNELS {
        return Err(RejectReason::DegenerateInput {
            width: w,
            height: h,
        });
    }

    let half_diagonal = (w as f64).hypot(h as f64) / 2.0;
    let rows = AxisTiling::new(h, half_diagonal);
    let cols = AxisTiling::new(w, half_diagonal);

    let tiled = gather(source, &rows.map, &cols.map);
    let kernel = (w.max(h) / BLUR_DIVISOR).max(1);
    let mut canvas = box_blur(&tiled, kernel);
    drop(tiled);
    paste(&mut canvas, source, cols.stride, rows.stride);

    debug!(
        "mirror pad: {w}x{h} -> {}x{} stride=({}, {}) blur={kernel}",
        canvas.width, canvas.height, cols.stride, rows.stride
    );

    Ok(PaddedCanvas {
        image: canvas,
        stride_h: rows.stride,
        stride_w: cols.stride,
        source_width: w,
        source_height: h,
    })
}

/// Build the canvas whose pixel `(x, y)` is `source(col_map[x], row_map[y])`.
fn gather(source: &DecodedImage, row_map: &[u32], col_map: &[u32]) -> DecodedImage {
    let width = col_map.len();
    let mut pixels = Vec::with_capacity(width * row_map.len() * DecodedImage::CHANNELS);
    for &sy in row_map {
        let src_row = source.row(sy);
        for &sx in col_map {
            let i = sx as usize * DecodedImage::CHANNELS;
            pixels.extend_from_slice(&src_row[i..i + DecodedImage::CHANNELS]);
        }
    }
    DecodedImage::new(width as u32, row_map.len() as u32, pixels)
}

/// Overwrite the block at `(left, top)` of `canvas` with `patch`.
fn paste(canvas: &mut DecodedImage, patch: &DecodedImage, left: u32, top: u32) {
    let stride = canvas.row_stride();
    let start = left as usize * DecodedImage::CHANNELS;
    let len = patch.row_stride();
    for y in 0..patch.height {
        let row_start = (top + y) as usize * stride + start;
        canvas.pixels[row_start..row_start + len].copy_from_slice(patch.row(y));
    }
}
