//! Replays recorded detector output, one JSON object per line:
//!
//! ```text
//! {"frame": 0, "detections": [[10,10,50,50, 15,20,35,20,25,30,18,40,32,40, 0.92]]}
//! {"frame": 1, "detections": []}
//! ```
//!
//! Lets the classifier run offline, without any inference engine.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::raw_detection::{BackendKind, RawDetection};
use crate::shared::frame::Frame;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read detections from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("line {line}: frame {frame} already recorded")]
    DuplicateFrame { line: usize, frame: usize },
}

#[derive(Deserialize)]
struct RecordedFrame {
    frame: usize,
    #[serde(default)]
    detections: Vec<RawDetection>,
}

/// [`FaceDetector`] backed by a recording keyed on frame index.
///
/// Frames missing from the recording have no detections.
#[derive(Debug)]
pub struct ReplayDetector {
    backend: BackendKind,
    frames: HashMap<usize, Vec<RawDetection>>,
}

impl ReplayDetector {
    pub fn new(backend: BackendKind, frames: HashMap<usize, Vec<RawDetection>>) -> Self {
        Self { backend, frames }
    }

    pub fn from_path(path: &Path, backend: BackendKind) -> Result<Self, ReplayError> {
        let io_err = |source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        Self::from_reader(BufReader::new(file), backend).map_err(|e| match e {
            ReplayError::Io { source, .. } => io_err(source),
            other => other,
        })
    }

    /// Parses JSON lines; blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R, backend: BackendKind) -> Result<Self, ReplayError> {
        let mut frames = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|source| ReplayError::Io {
                path: PathBuf::new(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let recorded: RecordedFrame =
                serde_json::from_str(&line).map_err(|source| ReplayError::Parse {
                    line: line_no,
                    source,
                })?;
            if frames.insert(recorded.frame, recorded.detections).is_some() {
                return Err(ReplayError::DuplicateFrame {
                    line: line_no,
                    frame: recorded.frame,
                });
            }
        }
        log::debug!("Loaded {} recorded frames for {backend}", frames.len());
        Ok(Self::new(backend, frames))
    }

    pub fn recorded_frames(&self) -> usize {
        self.frames.len()
    }
}

impl FaceDetector for ReplayDetector {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        Ok(self.frames.get(&frame.index()).cloned().unwrap_or_default())
    }
}
