use serde::Serialize;

use super::detection::DetectionError;

/// Axis-aligned face box in frame pixel coordinates.
///
/// Construction rejects non-finite or inverted corners; zero-area boxes are
/// allowed and simply fail any positive size threshold later.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, DetectionError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(DetectionError::malformed(format!(
                "non-finite bbox ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        if x1 > x2 || y1 > y2 {
            return Err(DetectionError::malformed(format!(
                "inverted bbox ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Converts an `(x, y, width, height)` box.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Result<Self, DetectionError> {
        Self::new(x, y, x + width, y + height)
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn x2(&self) -> f64 {
        self.x2
    }

    pub fn y2(&self) -> f64 {
        self.y2
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Truncated integer corners `(x1, y1, x2, y2)`, as used for drawing.
    pub fn to_pixel_rect(&self) -> (i64, i64, i64, i64) {
        (
            self.x1 as i64,
            self.y1 as i64,
            self.x2 as i64,
            self.y2 as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_width_and_height() {
        let bbox = BoundingBox::new(10.0, 20.0, 110.0, 70.0).unwrap();
        assert_relative_eq!(bbox.width(), 100.0);
        assert_relative_eq!(bbox.height(), 50.0);
    }

    #[test]
    fn test_from_xywh_adds_extent() {
        let bbox = BoundingBox::from_xywh(10.0, 10.0, 50.0, 50.0).unwrap();
        assert_eq!(bbox, BoundingBox::new(10.0, 10.0, 60.0, 60.0).unwrap());
    }

    #[test]
    fn test_zero_area_is_accepted() {
        let bbox = BoundingBox::new(5.0, 5.0, 5.0, 5.0).unwrap();
        assert_relative_eq!(bbox.width(), 0.0);
    }

    #[rstest]
    #[case::inverted_x(50.0, 10.0, 10.0, 60.0)]
    #[case::inverted_y(10.0, 60.0, 60.0, 10.0)]
    #[case::nan(f64::NAN, 10.0, 60.0, 60.0)]
    #[case::infinite(10.0, 10.0, f64::INFINITY, 60.0)]
    fn test_rejects_bad_geometry(
        #[case] x1: f64,
        #[case] y1: f64,
        #[case] x2: f64,
        #[case] y2: f64,
    ) {
        let err = BoundingBox::new(x1, y1, x2, y2).unwrap_err();
        assert!(matches!(err, DetectionError::MalformedDetection { .. }));
    }

    #[test]
    fn test_negative_extent_from_xywh_is_inverted() {
        assert!(BoundingBox::from_xywh(10.0, 10.0, -20.0, 5.0).is_err());
    }

    #[test]
    fn test_pixel_rect_truncates() {
        let bbox = BoundingBox::new(10.7, 20.2, 99.9, 80.5).unwrap();
        assert_eq!(bbox.to_pixel_rect(), (10, 20, 99, 80));
    }
}
