//! 5-point face landmarks and the eye-line roll estimate.
//!
//! Point order is fixed: left eye, right eye, nose tip, left mouth corner,
//! right mouth corner. Every supported backend emits this order.

use serde::Serialize;

const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn left_eye(&self) -> (f64, f64) {
        self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> (f64, f64) {
        self.points[RIGHT_EYE]
    }

    /// Absolute angle of the left-to-right eye vector, in `[0, 180]` degrees.
    ///
    /// 0° is a level face; values near 180° come from mirrored eye order.
    pub fn roll_degrees(&self) -> f64 {
        let (lx, ly) = self.left_eye();
        let (rx, ry) = self.right_eye();
        (ry - ly).atan2(rx - lx).to_degrees().abs()
    }

    /// True when the roll is outside `max_tilt_degrees` of both 0° and 180°.
    pub fn is_tilted(&self, max_tilt_degrees: f64) -> bool {
        let roll = self.roll_degrees();
        roll > max_tilt_degrees && (180.0 - roll) > max_tilt_degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn with_eyes(left: (f64, f64), right: (f64, f64)) -> FaceLandmarks {
        FaceLandmarks::new([
            left,
            right,
            (25.0, 30.0), // nose
            (18.0, 40.0), // left_mouth
            (32.0, 40.0), // right_mouth
        ])
    }

    #[test]
    fn test_accessors_follow_fixed_order() {
        let lm = with_eyes((15.0, 20.0), (35.0, 20.0));
        assert_eq!(lm.left_eye(), (15.0, 20.0));
        assert_eq!(lm.right_eye(), (35.0, 20.0));
        assert_eq!(lm.points()[2], (25.0, 30.0));
    }

    #[rstest]
    #[case::level((0.0, 0.0), (10.0, 0.0), 0.0)]
    #[case::mirrored((10.0, 0.0), (0.0, 0.0), 180.0)]
    #[case::vertical_down((0.0, 0.0), (0.0, 10.0), 90.0)]
    #[case::vertical_up((0.0, 10.0), (0.0, 0.0), 90.0)]
    #[case::diagonal((0.0, 0.0), (10.0, 10.0), 45.0)]
    #[case::negative_slope((0.0, 10.0), (10.0, 0.0), 45.0)]
    fn test_roll_degrees(
        #[case] left: (f64, f64),
        #[case] right: (f64, f64),
        #[case] expected: f64,
    ) {
        assert_relative_eq!(with_eyes(left, right).roll_degrees(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_coincident_eyes_have_zero_roll() {
        let lm = with_eyes((5.0, 5.0), (5.0, 5.0));
        assert_relative_eq!(lm.roll_degrees(), 0.0);
    }

    #[rstest]
    #[case::level((0.0, 0.0), (10.0, 0.0), false)]
    #[case::mirrored((10.0, 0.0), (0.0, 0.0), false)]
    #[case::sideways((0.0, 0.0), (0.0, 10.0), true)]
    #[case::forty_five((0.0, 0.0), (10.0, 10.0), true)]
    #[case::slight((0.0, 0.0), (100.0, 20.0), false)]
    #[case::near_mirror((100.0, 0.0), (0.0, 20.0), false)]
    fn test_is_tilted_at_thirty_degrees(
        #[case] left: (f64, f64),
        #[case] right: (f64, f64),
        #[case] expected: bool,
    ) {
        assert_eq!(with_eyes(left, right).is_tilted(30.0), expected);
    }

    #[test]
    fn test_exact_tolerance_is_not_tilted() {
        // 30° exactly: tan(30°) * 10
        let lm = with_eyes((0.0, 0.0), (10.0, 10.0 * 30f64.to_radians().tan()));
        assert_relative_eq!(lm.roll_degrees(), 30.0, epsilon = 1e-9);
        assert!(!lm.is_tilted(30.0 + 1e-9));
    }

    #[test]
    fn test_ninety_degree_tolerance_never_tilts() {
        let lm = with_eyes((0.0, 0.0), (0.0, 10.0));
        assert!(!lm.is_tilted(90.0));
    }

    #[test]
    fn test_zero_tolerance_tilts_any_slope() {
        let lm = with_eyes((0.0, 0.0), (10.0, 1.0));
        assert!(lm.is_tilted(0.0));
        assert!(!with_eyes((0.0, 0.0), (10.0, 0.0)).is_tilted(0.0));
    }
}
