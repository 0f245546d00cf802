//! Hand subsystem: per-frame hand poses and the wheel reading built on them.
//!
//! Provides:
//! - `pose`: landmark model, handedness, and the per-frame `Frame`
//! - `wheel`: steering angle and thumb-open detection (`AngleExtractor`)

pub mod pose;
pub mod wheel;

pub use pose::{Frame, FrameInput, Hand, HandLandmark, HandPose, Landmark, LANDMARK_COUNT};
pub use wheel::{AngleExtractor, WheelConfig, WheelReading};
