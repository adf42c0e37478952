use crate::shared::frame::Frame;

use super::raw_detection::{BackendKind, RawDetection};

/// Injected detection capability: given a frame, return zero or more raw
/// detections in the backend's own shape.
///
/// Implementations may hold inference sessions or replay state, hence
/// `&mut self`.
pub trait FaceDetector: Send {
    /// Tag used to normalize everything this detector returns.
    fn backend(&self) -> BackendKind;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>>;
}
