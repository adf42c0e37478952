use std::path::Path;

use crate::shared::frame::Frame;

/// Persists one frame as an image file.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
