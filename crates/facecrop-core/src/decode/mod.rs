//! Image decoding and resizing.
//!
//! Input photographs are decoded to packed RGB8 with EXIF orientation
//! applied, so every later stage sees the picture upright. Resizing wraps
//! the `image` crate's resamplers.

mod reader;
mod resize;
mod types;

pub use reader::{decode_image, read_image};
pub use resize::{resize, resize_long_side};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
