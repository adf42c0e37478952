//! Converts backend-specific raw records into canonical [`Detection`]s.

use crate::shared::constants::{FLAT_DETECTION_LEN, LANDMARK_COUNT};

use super::bounding_box::BoundingBox;
use super::detection::{Detection, DetectionError};
use super::face_landmarks::FaceLandmarks;
use super::raw_detection::{BackendKind, KeypointRecord, RawDetection, RawLandmarks};

/// Normalizes one raw detection reported by `backend`.
///
/// Fails with [`DetectionError::MalformedDetection`] on inverted or
/// non-finite geometry rather than coercing it, and with
/// [`DetectionError::ShapeMismatch`] when the record does not have the
/// backend's wire shape.
pub fn normalize(raw: &RawDetection, backend: BackendKind) -> Result<Detection, DetectionError> {
    if raw.layout() != backend.layout() {
        return Err(DetectionError::ShapeMismatch { backend });
    }
    match raw {
        RawDetection::Keyed(record) => normalize_keyed(record),
        RawDetection::Flat(row) => normalize_flat_row(row),
    }
}

fn normalize_keyed(record: &KeypointRecord) -> Result<Detection, DetectionError> {
    let [x1, y1, x2, y2] = record.bbox;
    let bbox = BoundingBox::new(x1, y1, x2, y2)?;
    let landmarks = match &record.kps {
        None => None,
        Some(RawLandmarks::Pairs(pairs)) => landmarks_from_pairs(pairs)?,
        Some(RawLandmarks::Flat(values)) => landmarks_from_flat(values)?,
    };
    Detection::new(bbox, record.det_score, landmarks)
}

/// `[x, y, w, h, 10 landmark coords, score]`; the score is the last value
/// and never part of the landmark slice.
fn normalize_flat_row(row: &[f64]) -> Result<Detection, DetectionError> {
    if row.len() != FLAT_DETECTION_LEN {
        return Err(DetectionError::malformed(format!(
            "expected {FLAT_DETECTION_LEN} values, got {}",
            row.len()
        )));
    }
    let bbox = BoundingBox::from_xywh(row[0], row[1], row[2], row[3])?;
    let score = row[FLAT_DETECTION_LEN - 1];
    let landmarks = landmarks_from_flat(&row[4..FLAT_DETECTION_LEN - 1])?;
    Detection::new(bbox, score, landmarks)
}

fn landmarks_from_pairs(pairs: &[[f64; 2]]) -> Result<Option<FaceLandmarks>, DetectionError> {
    match pairs.len() {
        0 => Ok(None),
        LANDMARK_COUNT => {
            let mut points = [(0.0, 0.0); LANDMARK_COUNT];
            for (point, [x, y]) in points.iter_mut().zip(pairs) {
                *point = (*x, *y);
            }
            checked_landmarks(points).map(Some)
        }
        n => Err(DetectionError::malformed(format!(
            "expected {LANDMARK_COUNT} landmark pairs, got {n}"
        ))),
    }
}

fn landmarks_from_flat(values: &[f64]) -> Result<Option<FaceLandmarks>, DetectionError> {
    match values.len() {
        0 => Ok(None),
        n if n == LANDMARK_COUNT * 2 => {
            let mut points = [(0.0, 0.0); LANDMARK_COUNT];
            for (point, xy) in points.iter_mut().zip(values.chunks_exact(2)) {
                *point = (xy[0], xy[1]);
            }
            checked_landmarks(points).map(Some)
        }
        n => Err(DetectionError::malformed(format!(
            "expected {} landmark values, got {n}",
            LANDMARK_COUNT * 2
        ))),
    }
}

fn checked_landmarks(points: [(f64, f64); LANDMARK_COUNT]) -> Result<FaceLandmarks, DetectionError> {
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(DetectionError::malformed("non-finite landmark"));
    }
    Ok(FaceLandmarks::new(points))
}
