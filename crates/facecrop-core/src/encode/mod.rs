//! Image encoding for aligned outputs.
//!
//! The output format follows the destination file's extension so an input
//! `portrait.png` is written back as `portrait.png`. Files are written
//! through a temporary sibling and renamed into place.

mod writer;

pub use writer::{encode_image, output_format, write_image_atomic, EncodeError};
