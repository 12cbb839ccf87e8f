//! Core types for image decoding.

use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation, used for detector input and final output.
    #[default]
    Cubic,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Cubic => image::imageops::FilterType::CatmullRom,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded image with RGB pixel data.
///
/// Callers treat it as an immutable value; operations in this crate always
/// return a new image rather than editing one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length should be width * height * 3.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Number of interleaved channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create an image filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * Self::CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(width, height, pixels)
    }

    /// Create a DecodedImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbImage for further processing.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of one row in bytes.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Smaller of the two dimensions.
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Read one pixel. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = y as usize * self.row_stride() + x as usize * Self::CHANNELS;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    /// Borrow one row of packed RGB bytes.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.row_stride();
        &self.pixels[start..start + self.row_stride()]
    }

    /// Copy the `width x height` block whose top-left corner is `(left, top)`.
    ///
    /// The block must lie inside the image.
    pub fn sub_image(&self, left: u32, top: u32, width: u32, height: u32) -> DecodedImage {
        debug_assert!(left + width <= self.width && top + height <= self.height);
        let start = left as usize * Self::CHANNELS;
        let len = width as usize * Self::CHANNELS;
        let mut pixels = Vec::with_capacity(len * height as usize);
        for y in top..top + height {
            pixels.extend_from_slice(&self.row(y)[start..start + len]);
        }
        DecodedImage::new(width, height, pixels)
    }
}
