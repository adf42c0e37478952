use serde::Serialize;

use crate::classification::domain::validity_classifier::ValidityClassifier;
use crate::classification::domain::validity_label::ValidityLabel;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::normalizer::normalize;
use crate::detection::domain::raw_detection::{BackendKind, RawDetection};

pub const VALID_COLOR: [u8; 3] = [0, 255, 0];
pub const INVALID_COLOR: [u8; 3] = [255, 0, 0];

/// A detection paired with the label it received.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabeledDetection {
    pub detection: Detection,
    pub label: ValidityLabel,
}

impl LabeledDetection {
    /// Caption such as `"Valid (0.92)"`.
    pub fn annotation_text(&self) -> String {
        format!("{} ({:.2})", self.label, self.detection.confidence())
    }

    /// RGB drawing color: green for valid faces, red otherwise.
    pub fn color(&self) -> [u8; 3] {
        if self.label.is_valid() {
            VALID_COLOR
        } else {
            INVALID_COLOR
        }
    }
}

/// Classification output for one frame, in detector order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    pub labeled: Vec<LabeledDetection>,
    /// Raw detections rejected by the normalizer.
    pub dropped: usize,
}

impl FrameReport {
    pub fn count(&self, label: ValidityLabel) -> usize {
        self.labeled.iter().filter(|d| d.label == label).count()
    }
}

/// Normalizes and classifies every raw detection of one frame.
///
/// Malformed records are logged and skipped; the remaining detections keep
/// their relative order.
pub fn classify_frame(
    frame_index: usize,
    raw: &[RawDetection],
    backend: BackendKind,
    classifier: &ValidityClassifier,
) -> FrameReport {
    let mut report = FrameReport {
        frame_index,
        labeled: Vec::with_capacity(raw.len()),
        dropped: 0,
    };

    for (i, record) in raw.iter().enumerate() {
        match normalize(record, backend) {
            Ok(detection) => {
                let label = classifier.classify(&detection);
                log::debug!(
                    "frame {frame_index} detection {i}: {label} (confidence {:.2})",
                    detection.confidence()
                );
                report.labeled.push(LabeledDetection { detection, label });
            }
            Err(e) => {
                log::warn!("frame {frame_index} detection {i} dropped: {e}");
                report.dropped += 1;
            }
        }
    }

    report
}
