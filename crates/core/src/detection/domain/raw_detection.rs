//! Detector outputs as they arrive, before normalization.
//!
//! Two wire shapes exist. InsightFace and SCRFD expose a keyed record
//! (`bbox`, `det_score`, `kps`); YuNet emits one flat row of 15 numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which detector produced a raw record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// InsightFace `FaceAnalysis`: keyed record, corner bbox.
    Insightface,
    /// Standalone SCRFD: same record as InsightFace.
    Scrfd,
    /// OpenCV YuNet: `[x, y, w, h, lx0, ly0, .., lx4, ly4, score]`.
    Yunet,
}

impl BackendKind {
    pub const ALL: &[BackendKind] = &[BackendKind::Insightface, BackendKind::Scrfd, BackendKind::Yunet];

    pub fn layout(self) -> RawLayout {
        match self {
            BackendKind::Insightface | BackendKind::Scrfd => RawLayout::Keyed,
            BackendKind::Yunet => RawLayout::FlatRow,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Insightface => "insightface",
            BackendKind::Scrfd => "scrfd",
            BackendKind::Yunet => "yunet",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown backend '{s}' (expected insightface, scrfd or yunet)"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawLayout {
    Keyed,
    FlatRow,
}

/// Landmarks as a keyed backend reports them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLandmarks {
    /// `[[x, y], ...]`
    Pairs(Vec<[f64; 2]>),
    /// `[x0, y0, x1, y1, ...]`
    Flat(Vec<f64>),
}

/// Keyed record (InsightFace / SCRFD `Face` object).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeypointRecord {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f64; 4],
    pub det_score: f64,
    #[serde(default)]
    pub kps: Option<RawLandmarks>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDetection {
    Keyed(KeypointRecord),
    Flat(Vec<f64>),
}

impl RawDetection {
    pub fn layout(&self) -> RawLayout {
        match self {
            RawDetection::Keyed(_) => RawLayout::Keyed,
            RawDetection::Flat(_) => RawLayout::FlatRow,
        }
    }
}
