//! Hand landmark data structures for a single camera frame.
//!
//! Models the 21-point hand topology reported by the upstream detector.
//! Coordinates are frame-normalized (0.0-1.0) and the image is already
//! mirrored, so the user's physical right hand appears on image-right.

use tracing::debug;

// ── Landmark definitions ───────────────────────────────────

/// The 21 landmarks reported per detected hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Every landmark, in detector order.
    pub const ALL: [HandLandmark; LANDMARK_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Hand enum ──────────────────────────────────────────────

/// Which hand, as labeled by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a handedness label ("Left", "right", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

// ── Landmark point ─────────────────────────────────────────

/// One landmark in frame-normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; unused by the wheel reading.
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Convert to whole pixel coordinates, truncating toward zero.
    ///
    /// Kept in `f64` so off-frame points on huge frames cannot overflow.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (
            (f64::from(self.x) * f64::from(width)).trunc(),
            (f64::from(self.y) * f64::from(height)).trunc(),
        )
    }
}

// ── Hand pose ──────────────────────────────────────────────

/// Landmarks for one detected hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    hand: Hand,
    landmarks: Vec<Landmark>,
}

impl HandPose {
    /// Build a pose. `landmarks` must contain exactly 21 entries.
    pub fn new(hand: Hand, landmarks: Vec<Landmark>) -> Result<Self, String> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(format!(
                "expected {} landmarks for {} hand, got {}",
                LANDMARK_COUNT,
                hand.as_str(),
                landmarks.len()
            ));
        }
        Ok(Self { hand, landmarks })
    }

    /// Build a pose from a full landmark array.
    pub fn from_points(hand: Hand, landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self {
            hand,
            landmarks: landmarks.to_vec(),
        }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn landmark(&self, which: HandLandmark) -> Landmark {
        self.landmarks[which.index()]
    }

}

// ── Frame input ────────────────────────────────────────────

/// Hands detected in one frame, at most one per side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub left: Option<HandPose>,
    pub right: Option<HandPose>,
}

impl FrameInput {
    /// Sort detections by handedness. A repeated label replaces the
    /// earlier detection.
    pub fn from_poses(poses: impl IntoIterator<Item = HandPose>) -> Self {
        let mut input = Self::default();
        for pose in poses {
            let slot = match pose.hand() {
                Hand::Left => &mut input.left,
                Hand::Right => &mut input.right,
            };
            if slot.is_some() {
                debug!("duplicate {} hand in frame, keeping latest", pose.hand().as_str());
            }
            *slot = Some(pose);
        }
        input
    }

    /// Both hands, when both are present.
    pub fn both(&self) -> Option<(&HandPose, &HandPose)> {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }

    /// Number of hands present (0-2).
    pub fn hand_count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }
}

/// One acquired frame: detections plus the geometry and time they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub input: FrameInput,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture time in seconds.
    pub timestamp_s: f64,
}

// ── Test helpers ───────────────────────────────────────────

/// A pose with every landmark at `wrist`, except the thumb tip and MCP.
#[cfg(test)]
pub fn test_pose(hand: Hand, wrist: (f32, f32), thumb_mcp_x: f32, thumb_tip_x: f32) -> HandPose {
    let mut landmarks = [Landmark::new(wrist.0, wrist.1, 0.0); LANDMARK_COUNT];
    landmarks[HandLandmark::ThumbMcp.index()].x = thumb_mcp_x;
    landmarks[HandLandmark::ThumbTip.index()].x = thumb_tip_x;
    HandPose::from_points(hand, landmarks)
}
