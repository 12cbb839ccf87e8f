//! JPEG/PNG encoding and atomic file output.

use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur while encoding or writing an image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The output extension does not name a supported format
    #[error("Unsupported output format for {0}")]
    UnsupportedFormat(String),

    /// The encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Creating, writing or renaming the output file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode an image in the given format. `quality` only affects JPEG and is
/// clamped to 1-100.
pub fn encode_image(
    image: &DecodedImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Cursor::new(Vec::new());
    write_encoded(
        &mut buffer,
        &image.pixels,
        image.width,
        image.height,
        format,
        quality,
    )?;
    Ok(buffer.into_inner())
}

/// Resolve the output format from a path's extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, EncodeError> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(format),
        _ => Err(EncodeError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Encode `image` and write it to `path` without ever exposing a partial file.
///
/// The data goes to a temporary file in the destination directory, which
/// is then renamed over `path`. If the process dies mid-write only the
/// temporary file is left behind, and it is removed on drop otherwise.
pub fn write_image_atomic(path: &Path, image: &DecodedImage, quality: u8) -> Result<(), EncodeError> {
    let format = output_format(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_encoded(
            &mut writer,
            &image.pixels,
            image.width,
            image.height,
            format,
            quality,
        )?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| EncodeError::Io(e.error))?;
    Ok(())
}

fn write_encoded<W: Write>(
    writer: W,
    pixels: &[u8],
    width: u32,
    height: u32,
    format: ImageFormat,
    quality: u8,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let result = match format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(writer, quality.clamp(1, 100))
            .write_image(pixels, width, height, ExtendedColorType::Rgb8),
        ImageFormat::Png => {
            PngEncoder::new(writer).write_image(pixels, width, height, ExtendedColorType::Rgb8)
        }
        other => return Err(EncodeError::UnsupportedFormat(format!("{other:?}"))),
    };
    result.map_err(|e| EncodeError::EncodingFailed(e.to_string()))
}
