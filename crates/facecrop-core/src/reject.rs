//! Per-image rejection reasons.
//!
//! A rejection is fatal to one image only. Core stages return
//! `Result<_, RejectReason>` and the batch driver logs the reason and moves
//! on to the next file.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    /// The detector or landmark predictor failed, or no landmarks are available.
    #[error("detection failed: {0}")]
    DetectionFailed(String),

    /// Zero or several faces were found.
    #[error("expected exactly one face, found {count}")]
    NoUniqueFace { count: usize },

    /// The nose is too far off the eye midline.
    #[error("face is not frontal (score {score:.2} exceeds {threshold:.2})")]
    NotFrontal { score: f64, threshold: f64 },

    /// The aligned crop is smaller than the requested output.
    #[error("aligned crop {width}x{height} is smaller than {min}")]
    CropTooSmall { width: u32, height: u32, min: u32 },

    /// The source image has no pixels.
    #[error("source image has zero area ({width}x{height})")]
    DegenerateInput { width: u32, height: u32 },
}

impl RejectReason {
    /// Short label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::DetectionFailed(_) => "detection-failed",
            RejectReason::NoUniqueFace { .. } => "no-unique-face",
            RejectReason::NotFrontal { .. } => "not-frontal",
            RejectReason::CropTooSmall { .. } => "crop-too-small",
            RejectReason::DegenerateInput { .. } => "degenerate-input",
        }
    }
}
