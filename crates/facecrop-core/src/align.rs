//! Aligned face cropping.
//!
//! [`FaceAligner`] turns a padded canvas and raw-space landmarks into a
//! leveled, face-centered square. [`FaceNormalizer`] is the per-image entry
//! point that pads, locates landmarks and aligns in one call.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;
use crate::geometry::{CanvasSpace, LandmarkGeometry, LandmarkSet, RawSpace};
use crate::locate::LandmarkSource;
use crate::padding::{mirror_pad, PaddedCanvas};
use crate::reject::RejectReason;
use crate::transform::{crop_rect, rotate_about_center, rotate_point_about, CropRect};

/// How raw-image landmarks are moved onto the padded canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LandmarkOffset {
    /// Add the exact offset of the source inside the canvas.
    #[default]
    Stride,
    /// Add half the size difference between canvas and source. Up to half a
    /// pixel off when the tiling is asymmetric; kept for parity with crops
    /// produced by older tooling.
    CanvasCenter,
}

/// Rotates a padded canvas so the eye line is level and crops the face square.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceAligner {
    geometry: LandmarkGeometry,
    offset: LandmarkOffset,
}

impl FaceAligner {
    pub fn new(geometry: LandmarkGeometry) -> Self {
        Self {
            geometry,
            offset: LandmarkOffset::default(),
        }
    }

    pub fn with_offset(mut self, offset: LandmarkOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn geometry(&self) -> &LandmarkGeometry {
        &self.geometry
    }

    pub fn offset(&self) -> LandmarkOffset {
        self.offset
    }

    /// Crop the aligned face out of `canvas`.
    ///
    /// `landmarks` are in the coordinates of `raw`, the image `canvas` was
    /// padded from.
    ///
    /// # Errors
    ///
    /// - `NotFrontal` from the frontality gate
    /// - `DegenerateInput` when `raw` is empty or is not the canvas source
    /// - `CropTooSmall` when the crop square misses the canvas entirely
    pub fn align(
        &self,
        raw: &DecodedImage,
        canvas: &PaddedCanvas,
        landmarks: &LandmarkSet<RawSpace>,
    ) -> Result<DecodedImage, RejectReason> {
        if raw.is_empty() || canvas.source_size() != (raw.width, raw.height) {
            return Err(RejectReason::DegenerateInput {
                width: raw.width,
                height: raw.height,
            });
        }

        let on_canvas: LandmarkSet<CanvasSpace> = match self.offset {
            LandmarkOffset::Stride => canvas.to_canvas(landmarks),
            LandmarkOffset::CanvasCenter => canvas.to_canvas_centered(landmarks),
        };
        let transform = self.geometry.analyze(&on_canvas)?;

        // The image is rotated about the canvas center, so the anchor moves too.
        let pivot = (canvas.width() as f64 / 2.0, canvas.height() as f64 / 2.0);
        let degrees = transform.image_rotation_degrees();
        let (cx, cy) = rotate_point_about(
            (transform.center.x, transform.center.y),
            pivot,
            degrees.to_radians(),
        );

        let rect = CropRect::centered_square(cx, cy, transform.size, canvas.width(), canvas.height());
        if rect.is_empty() {
            return Err(RejectReason::CropTooSmall {
                width: rect.width(),
                height: rect.height(),
                min: 1,
            });
        }

        debug!(
            "align: rotate {degrees:.2}deg about ({:.1}, {:.1}), crop {rect:?}",
            pivot.0, pivot.1
        );

        let rotated = rotate_about_center(canvas.image(), degrees);
        Ok(crop_rect(&rotated, rect))
    }
}

/// Per-image alignment: pad, locate the landmarks, align.
#[derive(Debug, Clone)]
pub struct FaceNormalizer<L> {
    source: L,
    aligner: FaceAligner,
}

impl<L: LandmarkSource> FaceNormalizer<L> {
    pub fn new(source: L, aligner: FaceAligner) -> Self {
        Self { source, aligner }
    }

    pub fn source(&self) -> &L {
        &self.source
    }

    pub fn aligner(&self) -> &FaceAligner {
        &self.aligner
    }

    /// Align the face in `image`, which was read from `path`.
    pub fn align(&self, path: &Path, image: &DecodedImage) -> Result<DecodedImage, RejectReason> {
        if image.is_empty() {
            return Err(RejectReason::DegenerateInput {
                width: image.width,
                height: image.height,
            });
        }
        let canvas = mirror_pad(image)?;
        let landmarks = self.source.locate(path, image)?;
        self.aligner.align(image, &canvas, &landmarks)
    }
}
