use std::path::PathBuf;

/// Properties of an opened frame source.
///
/// Still images are reported as a one-frame stream with `fps = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero when the container does not report a frame count.
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn is_still_image(&self) -> bool {
        self.total_frames == 1 && self.fps == 0.0
    }
}
