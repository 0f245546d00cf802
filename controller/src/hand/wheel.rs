//! Wheel reading: steering angle and thumb poses from a pair of hands.
//!
//! The two wrists are treated as opposite points on the rim of an
//! imaginary steering wheel.  Thumbs sticking out sideways act as the
//! pedals.

use super::pose::{Hand, HandLandmark, HandPose};

/// Default thumb-open margin in normalized frame units.
pub const THUMB_OPEN_MARGIN: f32 = 0.03;

// ── Thumb rule ─────────────────────────────────────────────

/// Thumb-open comparison for one side.
///
/// The hands are mirror images of each other in a front-facing camera,
/// so an open left thumb points toward image-right and an open right
/// thumb toward image-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbRule {
    pub hand: Hand,
    /// +1.0 if the tip must lie right of the MCP joint, -1.0 if left.
    pub outward: f32,
}

const THUMB_RULES: [ThumbRule; 2] = [
    ThumbRule { hand: Hand::Left, outward: 1.0 },
    ThumbRule { hand: Hand::Right, outward: -1.0 },
];

impl ThumbRule {
    pub fn for_hand(hand: Hand) -> Self {
        let rule = match hand {
            Hand::Left => THUMB_RULES[0],
            Hand::Right => THUMB_RULES[1],
        };
        debug_assert_eq!(rule.hand, hand);
        rule
    }

    /// Whether the thumb tip sits more than `margin` outward of its MCP joint.
    pub fn is_open(&self, pose: &HandPose, margin: f32) -> bool {
        let tip = pose.landmark(HandLandmark::ThumbTip).x;
        let base = pose.landmark(HandLandmark::ThumbMcp).x;
        (tip - base) * self.outward > margin
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for the wheel reading.
#[derive(Debug, Clone)]
pub struct WheelConfig {
    /// Thumb-open margin in normalized units.
    pub thumb_margin: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            thumb_margin: THUMB_OPEN_MARGIN,
        }
    }
}

// ── Reading ────────────────────────────────────────────────

/// Per-frame gesture reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelReading {
    /// Angle of the left-wrist to right-wrist line, in (-180, 180].
    /// Positive when the right hand is lower on screen.
    pub angle_deg: f64,
    pub left_thumb_open: bool,
    pub right_thumb_open: bool,
}

/// Computes the wheel reading from both hands.
#[derive(Debug, Clone, Default)]
pub struct AngleExtractor {
    pub config: WheelConfig,
}

impl AngleExtractor {
    pub fn new(config: WheelConfig) -> Self {
        Self { config }
    }

    /// Read the wheel for a frame of `width` x `height` pixels.
    ///
    /// The angle is measured in pixel space, so non-square frames are
    /// not distorted.
    pub fn extract(&self, left: &HandPose, right: &HandPose, width: u32, height: u32) -> WheelReading {
        let (lx, ly) = left.landmark(HandLandmark::Wrist).to_pixel(width, height);
        let (rx, ry) = right.landmark(HandLandmark::Wrist).to_pixel(width, height);

        let angle_deg = (ry - ly).atan2(rx - lx).to_degrees();

        WheelReading {
            angle_deg,
            left_thumb_open: ThumbRule::for_hand(Hand::Left).is_open(left, self.config.thumb_margin),
            right_thumb_open: ThumbRule::for_hand(Hand::Right).is_open(right, self.config.thumb_margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::pose::test_pose;

    fn level_pair(left_y: f32, right_y: f32) -> (HandPose, HandPose) {
        (
            test_pose(Hand::Left, (0.25, left_y), 0.25, 0.25),
            test_pose(Hand::Right, (0.75, right_y), 0.75, 0.75),
        )
    }

    #[test]
    fn test_level_hands_zero_angle() {
        let (l, r) = level_pair(0.5, 0.5);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert_eq!(reading.angle_deg, 0.0);
    }

    #[test]
    fn test_right_hand_lower_is_positive() {
        let (l, r) = level_pair(0.25, 0.75);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!((reading.angle_deg - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_hand_higher_is_negative() {
        let (l, r) = level_pair(0.75, 0.25);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!((reading.angle_deg + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_uses_pixel_aspect() {
        // 400px wide, 100px tall in a 800x400 frame.
        let (l, r) = level_pair(0.5, 0.75);
        let reading = AngleExtractor::default().extract(&l, &r, 800, 400);
        let expected = (100.0f64).atan2(400.0).to_degrees();
        assert!((reading.angle_deg - expected).abs() < 1e-9);
    }

    #[test]
    fn test_crossed_hands_near_180() {
        let l = test_pose(Hand::Left, (0.75, 0.5), 0.75, 0.75);
        let r = test_pose(Hand::Right, (0.25, 0.5), 0.25, 0.25);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!((reading.angle_deg - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_off_frame_wrists_on_huge_frame() {
        let l = test_pose(Hand::Left, (-1.0, 0.5), -1.0, -1.0);
        let r = test_pose(Hand::Right, (1.0, 0.5), 1.0, 1.0);
        let reading = AngleExtractor::default().extract(&l, &r, u32::MAX, 480);
        assert_eq!(reading.angle_deg, 0.0);

        let r = test_pose(Hand::Right, (1.0, 1.0), 1.0, 1.0);
        let reading = AngleExtractor::default().extract(&l, &r, u32::MAX, u32::MAX);
        assert!(reading.angle_deg.is_finite());
        assert!(reading.angle_deg > 0.0 && reading.angle_deg < 90.0);
    }

    #[test]
    fn test_left_thumb_open_points_right() {
        let l = test_pose(Hand::Left, (0.25, 0.5), 0.30, 0.35);
        let r = test_pose(Hand::Right, (0.75, 0.5), 0.70, 0.70);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!(reading.left_thumb_open);
        assert!(!reading.right_thumb_open);
    }

    #[test]
    fn test_right_thumb_open_points_left() {
        let l = test_pose(Hand::Left, (0.25, 0.5), 0.30, 0.30);
        let r = test_pose(Hand::Right, (0.75, 0.5), 0.70, 0.65);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!(!reading.left_thumb_open);
        assert!(reading.right_thumb_open);
    }

    #[test]
    fn test_thumb_within_margin_is_closed() {
        let l = test_pose(Hand::Left, (0.25, 0.5), 0.30, 0.32);
        let r = test_pose(Hand::Right, (0.75, 0.5), 0.70, 0.68);
        let reading = AngleExtractor::default().extract(&l, &r, 400, 400);
        assert!(!reading.left_thumb_open);
        assert!(!reading.right_thumb_open);
    }

    #[test]
    fn test_thumb_rule_is_mirrored() {
        // Same displacement reads open on one side only.
        let l = test_pose(Hand::Left, (0.5, 0.5), 0.50, 0.60);
        let r = test_pose(Hand::Right, (0.5, 0.5), 0.50, 0.60);
        assert!(ThumbRule::for_hand(Hand::Left).is_open(&l, THUMB_OPEN_MARGIN));
        assert!(!ThumbRule::for_hand(Hand::Right).is_open(&r, THUMB_OPEN_MARGIN));
    }

    #[test]
    fn test_custom_margin() {
        let extractor = AngleExtractor::new(WheelConfig { thumb_margin: 0.2 });
        let l = test_pose(Hand::Left, (0.25, 0.5), 0.30, 0.45);
        let r = test_pose(Hand::Right, (0.75, 0.5), 0.70, 0.70);
        assert!(!extractor.extract(&l, &r, 400, 400).left_thumb_open);
    }
}
