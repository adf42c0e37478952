//! Validity thresholds and the order of the post-confidence checks.
//!
//! The detection scripts this tool replaces disagree on the second stage:
//! one checks face size, one checks roll, one does both. [`RuleOrder`]
//! names each variant so every behavior stays reproducible.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_MAX_TILT_DEGREES, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_FACE_SIZE,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("min confidence must be between 0.0 and 1.0, got {0}")]
    InvalidConfidence(f64),

    #[error("min face size must be a non-negative number of pixels, got {0}")]
    InvalidFaceSize(f64),

    #[error("max tilt must be between 0 and 90 degrees, got {0}")]
    InvalidTilt(f64),

    #[error("cannot read policy {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("invalid policy {}: {reason}", path.display())]
    InvalidJson { path: PathBuf, reason: String },
}

/// A check evaluated after the confidence gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Size,
    Tilt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleOrder {
    /// confidence → size → tilt
    #[default]
    SizeThenTilt,
    /// confidence → tilt → size
    TiltThenSize,
    /// confidence → size; roll is never checked
    SizeOnly,
    /// confidence → tilt; size is never checked
    TiltOnly,
}

impl RuleOrder {
    pub const ALL: &[RuleOrder] = &[
        RuleOrder::SizeThenTilt,
        RuleOrder::TiltThenSize,
        RuleOrder::SizeOnly,
        RuleOrder::TiltOnly,
    ];

    pub fn stages(self) -> &'static [Stage] {
        match self {
            RuleOrder::SizeThenTilt => &[Stage::Size, Stage::Tilt],
            RuleOrder::TiltThenSize => &[Stage::Tilt, Stage::Size],
            RuleOrder::SizeOnly => &[Stage::Size],
            RuleOrder::TiltOnly => &[Stage::Tilt],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RuleOrder::SizeThenTilt => "size-then-tilt",
            RuleOrder::TiltThenSize => "tilt-then-size",
            RuleOrder::SizeOnly => "size-only",
            RuleOrder::TiltOnly => "tilt-only",
        }
    }
}

impl fmt::Display for RuleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleOrder::ALL
            .iter()
            .copied()
            .find(|order| order.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = RuleOrder::ALL.iter().map(|o| o.name()).collect();
                format!("unknown rule order '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Thresholds applied to every detection of a run.
///
/// Every way of building a policy validates it: [`ClassificationPolicy::new`],
/// the presets, [`ClassificationPolicy::with_overrides`] and JSON loading.
/// Missing JSON fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFields")]
pub struct ClassificationPolicy {
    min_confidence: f64,
    min_face_size: f64,
    max_tilt_degrees: f64,
    rule_order: RuleOrder,
}

/// Unchecked JSON shape of a policy.
#[derive(Deserialize)]
#[serde(default)]
struct PolicyFields {
    min_confidence: f64,
    min_face_size: f64,
    max_tilt_degrees: f64,
    rule_order: RuleOrder,
}

impl Default for PolicyFields {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            max_tilt_degrees: DEFAULT_MAX_TILT_DEGREES,
            rule_order: RuleOrder::default(),
        }
    }
}

impl TryFrom<PolicyFields> for ClassificationPolicy {
    type Error = PolicyError;

    fn try_from(f: PolicyFields) -> Result<Self, Self::Error> {
        Self::new(f.min_confidence, f.min_face_size, f.max_tilt_degrees, f.rule_order)
    }
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            max_tilt_degrees: DEFAULT_MAX_TILT_DEGREES,
            rule_order: RuleOrder::default(),
        }
    }
}

impl ClassificationPolicy {
    pub fn new(
        min_confidence: f64,
        min_face_size: f64,
        max_tilt_degrees: f64,
        rule_order: RuleOrder,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            min_confidence,
            min_face_size,
            max_tilt_degrees,
            rule_order,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// InsightFace threshold script: confidence 0.5, 60 px faces, no roll.
    pub fn insightface_threshold() -> Self {
        Self {
            min_confidence: 0.5,
            min_face_size: 60.0,
            max_tilt_degrees: DEFAULT_MAX_TILT_DEGREES,
            rule_order: RuleOrder::SizeOnly,
        }
    }

    /// InsightFace angle script: confidence 0.6, then roll within 30°.
    pub fn insightface_angle() -> Self {
        Self {
            min_confidence: 0.6,
            min_face_size: 0.0,
            max_tilt_degrees: 30.0,
            rule_order: RuleOrder::TiltOnly,
        }
    }

    /// YuNet script: the detector's own 0.9 score gate, then roll within 30°.
    pub fn yunet_roll() -> Self {
        Self {
            min_confidence: 0.9,
            min_face_size: 0.0,
            max_tilt_degrees: 30.0,
            rule_order: RuleOrder::TiltOnly,
        }
    }

    pub const PRESET_NAMES: [&'static str; 3] =
        ["insightface-threshold", "insightface-angle", "yunet-roll"];

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "insightface-threshold" => Some(Self::insightface_threshold()),
            "insightface-angle" => Some(Self::insightface_angle()),
            "yunet-roll" => Some(Self::yunet_roll()),
            _ => None,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|e| PolicyError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| PolicyError::InvalidJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Replaces the given thresholds, keeping the rest, and re-validates.
    pub fn with_overrides(
        self,
        min_confidence: Option<f64>,
        min_face_size: Option<f64>,
        max_tilt_degrees: Option<f64>,
        rule_order: Option<RuleOrder>,
    ) -> Result<Self, PolicyError> {
        Self::new(
            min_confidence.unwrap_or(self.min_confidence),
            min_face_size.unwrap_or(self.min_face_size),
            max_tilt_degrees.unwrap_or(self.max_tilt_degrees),
            rule_order.unwrap_or(self.rule_order),
        )
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn min_face_size(&self) -> f64 {
        self.min_face_size
    }

    pub fn max_tilt_degrees(&self) -> f64 {
        self.max_tilt_degrees
    }

    pub fn rule_order(&self) -> RuleOrder {
        self.rule_order
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PolicyError::InvalidConfidence(self.min_confidence));
        }
        if !(self.min_face_size.is_finite() && self.min_face_size >= 0.0) {
            return Err(PolicyError::InvalidFaceSize(self.min_face_size));
        }
        if !(0.0..=90.0).contains(&self.max_tilt_degrees) {
            return Err(PolicyError::InvalidTilt(self.max_tilt_degrees));
        }
        Ok(())
    }
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "confidence >= {}, size >= {}px, tilt <= {}°, order {}",
            self.min_confidence, self.min_face_size, self.max_tilt_degrees, self.rule_order
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_every_preset_name_resolves() {
        for name in ClassificationPolicy::PRESET_NAMES {
            let policy = ClassificationPolicy::preset(name).unwrap();
            assert!(policy.validate().is_ok(), "{name}");
            assert!(policy.clone().with_overrides(None, None, None, None).is_ok());
        }
        assert!(ClassificationPolicy::preset("opencv").is_none());
    }

    #[test]
    fn test_default_matches_constants() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.min_confidence(), DEFAULT_MIN_CONFIDENCE);
        assert_eq!(policy.min_face_size(), DEFAULT_MIN_FACE_SIZE);
        assert_eq!(policy.max_tilt_degrees(), DEFAULT_MAX_TILT_DEGREES);
        assert_eq!(policy.rule_order(), RuleOrder::SizeThenTilt);
        assert!(policy.validate().is_ok());
    }

    #[rstest]
    #[case::threshold(ClassificationPolicy::insightface_threshold())]
    #[case::angle(ClassificationPolicy::insightface_angle())]
    #[case::yunet(ClassificationPolicy::yunet_roll())]
    fn test_presets_are_valid(#[case] policy: ClassificationPolicy) {
        assert!(policy.validate().is_ok());
    }

    #[rstest]
    #[case::confidence_negative(-0.1, 60.0, 30.0, PolicyError::InvalidConfidence(-0.1))]
    #[case::confidence_above_one(1.1, 60.0, 30.0, PolicyError::InvalidConfidence(1.1))]
    #[case::size_negative(0.5, -1.0, 30.0, PolicyError::InvalidFaceSize(-1.0))]
    #[case::tilt_above_ninety(0.5, 60.0, 91.0, PolicyError::InvalidTilt(91.0))]
    #[case::tilt_negative(0.5, 60.0, -5.0, PolicyError::InvalidTilt(-5.0))]
    fn test_new_rejects_out_of_range(
        #[case] confidence: f64,
        #[case] size: f64,
        #[case] tilt: f64,
        #[case] expected: PolicyError,
    ) {
        let err = ClassificationPolicy::new(confidence, size, tilt, RuleOrder::default()).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_new_rejects_nan_confidence() {
        let result = ClassificationPolicy::new(f64::NAN, 60.0, 30.0, RuleOrder::default());
        assert!(matches!(result, Err(PolicyError::InvalidConfidence(_))));
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(ClassificationPolicy::new(0.0, 0.0, 0.0, RuleOrder::SizeOnly).is_ok());
        assert!(ClassificationPolicy::new(1.0, 1000.0, 90.0, RuleOrder::TiltOnly).is_ok());
    }

    #[rstest]
    #[case::size_then_tilt(RuleOrder::SizeThenTilt, &[Stage::Size, Stage::Tilt])]
    #[case::tilt_then_size(RuleOrder::TiltThenSize, &[Stage::Tilt, Stage::Size])]
    #[case::size_only(RuleOrder::SizeOnly, &[Stage::Size])]
    #[case::tilt_only(RuleOrder::TiltOnly, &[Stage::Tilt])]
    fn test_rule_order_stages(#[case] order: RuleOrder, #[case] expected: &[Stage]) {
        assert_eq!(order.stages(), expected);
    }

    #[test]
    fn test_rule_order_round_trips_through_name() {
        for order in RuleOrder::ALL {
            assert_eq!(order.name().parse::<RuleOrder>().unwrap(), *order);
        }
        assert!("tilt-first".parse::<RuleOrder>().is_err());
    }

    #[test]
    fn test_deserialize_partial_json_fills_defaults() {
        let json = r#"{"min_confidence": 0.7, "rule_order": "tilt-only"}"#;
        let policy: ClassificationPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.min_confidence(), 0.7);
        assert_eq!(policy.rule_order(), RuleOrder::TiltOnly);
        assert_eq!(policy.min_face_size(), DEFAULT_MIN_FACE_SIZE);
    }

    #[rstest]
    #[case::confidence_above_one(r#"{"min_confidence": 1.5}"#)]
    #[case::negative_size(r#"{"min_face_size": -3}"#)]
    #[case::tilt_above_ninety(r#"{"max_tilt_degrees": 120}"#)]
    fn test_deserialize_validates_ranges(#[case] json: &str) {
        let err = serde_json::from_str::<ClassificationPolicy>(json).unwrap_err();
        assert!(err.to_string().contains("must be"), "{err}");
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[rstest]
    #[case::preset_tilt_override(
        ClassificationPolicy::yunet_roll(),
        (None, None, Some(45.0), None),
        (0.9, 0.0, 45.0, RuleOrder::TiltOnly)
    )]
    #[case::preset_order_and_size_override(
        ClassificationPolicy::insightface_angle(),
        (None, Some(80.0), None, Some(RuleOrder::SizeThenTilt)),
        (0.6, 80.0, 30.0, RuleOrder::SizeThenTilt)
    )]
    #[case::default_confidence_override(
        ClassificationPolicy::default(),
        (Some(0.75), None, None, None),
        (0.75, DEFAULT_MIN_FACE_SIZE, DEFAULT_MAX_TILT_DEGREES, RuleOrder::SizeThenTilt)
    )]
    fn test_flags_override_base_policy(
        #[case] base: ClassificationPolicy,
        #[case] overrides: (Option<f64>, Option<f64>, Option<f64>, Option<RuleOrder>),
        #[case] expected: (f64, f64, f64, RuleOrder),
    ) {
        let (confidence, size, tilt, order) = overrides;
        let policy = base.with_overrides(confidence, size, tilt, order).unwrap();
        assert_eq!(
            (
                policy.min_confidence(),
                policy.min_face_size(),
                policy.max_tilt_degrees(),
                policy.rule_order()
            ),
            expected
        );
    }

    #[test]
    fn test_json_file_then_flag_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{"min_confidence": 0.7, "min_face_size": 40, "rule_order": "tilt-then-size"}"#,
        )
        .unwrap();

        let policy = ClassificationPolicy::from_json_file(&path)
            .unwrap()
            .with_overrides(None, Some(100.0), None, None)
            .unwrap();

        assert_eq!(policy.min_confidence(), 0.7);
        assert_eq!(policy.min_face_size(), 100.0);
        assert_eq!(policy.max_tilt_degrees(), DEFAULT_MAX_TILT_DEGREES);
        assert_eq!(policy.rule_order(), RuleOrder::TiltThenSize);
    }

    #[rstest]
    #[case::confidence(Some(1.2), None, None, PolicyError::InvalidConfidence(1.2))]
    #[case::size(None, Some(-10.0), None, PolicyError::InvalidFaceSize(-10.0))]
    #[case::tilt(None, None, Some(95.0), PolicyError::InvalidTilt(95.0))]
    fn test_out_of_range_override_rejected(
        #[case] confidence: Option<f64>,
        #[case] size: Option<f64>,
        #[case] tilt: Option<f64>,
        #[case] expected: PolicyError,
    ) {
        let err = ClassificationPolicy::insightface_threshold()
            .with_overrides(confidence, size, tilt, None)
            .unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_nan_override_rejected() {
        let result = ClassificationPolicy::default().with_overrides(Some(f64::NAN), None, None, None);
        assert!(matches!(result, Err(PolicyError::InvalidConfidence(_))));
    }

    #[test]
    fn test_missing_policy_file_is_unreadable() {
        let err = ClassificationPolicy::from_json_file(Path::new("/nonexistent/policy.json"))
            .unwrap_err();
        assert!(matches!(err, PolicyError::Unreadable { .. }));
    }

    #[test]
    fn test_out_of_range_policy_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"max_tilt_degrees": 200}"#).unwrap();
        let err = ClassificationPolicy::from_json_file(&path).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidJson { .. }));
        assert!(err.to_string().contains("max tilt"));
    }

    #[test]
    fn test_deserialize_unknown_rule_order_fails() {
        let json = r#"{"rule_order": "sideways"}"#;
        assert!(serde_json::from_str::<ClassificationPolicy>(json).is_err());
    }
}
