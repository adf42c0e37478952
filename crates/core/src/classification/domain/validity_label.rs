use std::fmt;

use serde::Serialize;

/// Outcome of classifying one detection. Exactly one per detection per pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityLabel {
    Valid,
    LowConfidence,
    TooSmall,
    Tilted,
}

impl ValidityLabel {
    pub const ALL: &[ValidityLabel] = &[
        ValidityLabel::Valid,
        ValidityLabel::LowConfidence,
        ValidityLabel::TooSmall,
        ValidityLabel::Tilted,
    ];

    pub fn is_valid(self) -> bool {
        self == ValidityLabel::Valid
    }

    /// Short on-screen caption.
    pub fn caption(self) -> &'static str {
        match self {
            ValidityLabel::Valid => "Valid",
            ValidityLabel::LowConfidence => "LowConf",
            ValidityLabel::TooSmall => "TooSmall",
            ValidityLabel::Tilted => "Tilted",
        }
    }
}

impl fmt::Display for ValidityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}
