use crate::detection::domain::detection::Detection;

use super::classification_policy::{ClassificationPolicy, Stage};
use super::validity_label::ValidityLabel;

/// Labels one detection under `policy`. Pure: same inputs, same label.
///
/// The confidence gate always runs first. The remaining checks run in the
/// policy's [`RuleOrder`](super::classification_policy::RuleOrder) and the
/// first failing one decides the label. A detection without landmarks
/// cannot fail the tilt check.
pub fn classify(detection: &Detection, policy: &ClassificationPolicy) -> ValidityLabel {
    if detection.confidence() < policy.min_confidence() {
        return ValidityLabel::LowConfidence;
    }

    for stage in policy.rule_order().stages() {
        match stage {
            Stage::Size if is_too_small(detection, policy.min_face_size()) => {
                return ValidityLabel::TooSmall;
            }
            Stage::Tilt if is_too_tilted(detection, policy.max_tilt_degrees()) => {
                return ValidityLabel::Tilted;
            }
            _ => {}
        }
    }

    ValidityLabel::Valid
}

fn is_too_small(detection: &Detection, min_face_size: f64) -> bool {
    let bbox = detection.bbox();
    bbox.width() < min_face_size || bbox.height() < min_face_size
}

fn is_too_tilted(detection: &Detection, max_tilt_degrees: f64) -> bool {
    detection
        .landmarks()
        .is_some_and(|lm| lm.is_tilted(max_tilt_degrees))
}

/// A policy bound for the length of a run.
#[derive(Clone, Debug, Default)]
pub struct ValidityClassifier {
    policy: ClassificationPolicy,
}

impl ValidityClassifier {
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    pub fn classify(&self, detection: &Detection) -> ValidityLabel {
        classify(detection, &self.policy)
    }
}
