use serde::Serialize;
use thiserror::Error;

use super::bounding_box::BoundingBox;
use super::face_landmarks::FaceLandmarks;
use super::raw_detection::BackendKind;

/// Why a raw detector record could not become a [`Detection`].
///
/// The pipeline drops the offending record and keeps the rest of the frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("malformed detection: {reason}")]
    MalformedDetection { reason: String },

    #[error("raw detection shape does not match the {backend} backend")]
    ShapeMismatch { backend: BackendKind },
}

impl DetectionError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDetection {
            reason: reason.into(),
        }
    }
}

/// Canonical face detection shared by every backend.
///
/// Immutable once built: the bbox is ordered and finite, confidence is in
/// `[0, 1]`, and landmarks are either absent or the full 5-point set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    bbox: BoundingBox,
    confidence: f64,
    landmarks: Option<FaceLandmarks>,
}

impl Detection {
    pub fn new(
        bbox: BoundingBox,
        confidence: f64,
        landmarks: Option<FaceLandmarks>,
    ) -> Result<Self, DetectionError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DetectionError::malformed(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            bbox,
            confidence,
            landmarks,
        })
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn landmarks(&self) -> Option<&FaceLandmarks> {
        self.landmarks.as_ref()
    }

    /// Landmark points as a slice: empty, or exactly five.
    pub fn landmark_points(&self) -> &[(f64, f64)] {
        match &self.landmarks {
            Some(lm) => lm.points(),
            None => &[],
        }
    }
}
