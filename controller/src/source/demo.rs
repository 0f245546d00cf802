//! Demo source: a synthetic two-hand wheel for running without a camera.
//!
//! The wheel angle sweeps sinusoidally between `±amplitude_deg`.  Each
//! sweep is split into quarters: left thumb out (accelerate), thumbs in,
//! right thumb out (brake), thumbs in.  Both hands vanish for the last
//! `dropout_fraction` of every sweep so hand loss gets exercised too.

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use tracing::info;

use super::PoseSource;
use crate::hand::{Frame, FrameInput, Hand, HandLandmark, HandPose, Landmark, LANDMARK_COUNT};

/// Wrist distance from frame center, as a fraction of the shorter side.
const WHEEL_RADIUS: f64 = 0.2;

/// Thumb offset from its MCP when extended (normalized units).
const THUMB_REACH: f32 = 0.06;

/// Demo source configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Stop after this many frames; run forever when `None`.
    pub frame_count: Option<u64>,
    /// Target frame rate.
    pub fps: f64,
    /// Seconds per full left-right sweep.
    pub period_s: f64,
    /// Peak wheel angle in degrees.
    pub amplitude_deg: f64,
    pub width: u32,
    pub height: u32,
    /// Fraction of each sweep (0.0-1.0) with no hands in view.
    pub dropout_fraction: f64,
    /// Pace frames with wall-clock sleeps and stamp wall-clock time.
    /// Otherwise frames are produced immediately with `index / fps` stamps.
    pub realtime: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_count: None,
            fps: 30.0,
            period_s: 6.0,
            amplitude_deg: 70.0,
            width: 640,
            height: 480,
            dropout_fraction: 0.1,
            realtime: true,
        }
    }
}

impl DemoConfig {
    /// Check ranges. Returns `Err` describing the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("demo fps must be positive, got {}", self.fps));
        }
        if !(self.period_s.is_finite() && self.period_s > 0.0) {
            return Err(format!("demo period must be positive, got {}", self.period_s));
        }
        if !(0.0..1.0).contains(&self.dropout_fraction) {
            return Err(format!(
                "demo dropout fraction must be in [0, 1), got {}",
                self.dropout_fraction
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("demo frame size must be non-zero, got {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

/// Which thumbs are out in a given quarter of the sweep.
fn thumb_schedule(phase: f64) -> (bool, bool) {
    match (phase * 4.0) as u32 {
        0 => (true, false),
        2 => (false, true),
        _ => (false, false),
    }
}

/// Synthetic frame generator.
pub struct DemoSource {
    config: DemoConfig,
    index: u64,
    started: Option<Instant>,
}

impl DemoSource {
    pub fn new(config: DemoConfig) -> Self {
        info!(
            "Demo source: {:.0} fps, ±{:.0}° over {:.1}s sweeps, {}x{}{}",
            config.fps,
            config.amplitude_deg,
            config.period_s,
            config.width,
            config.height,
            if config.realtime { "" } else { " (unpaced)" }
        );
        Self {
            config,
            index: 0,
            started: None,
        }
    }

    /// Wheel angle at `t` seconds into the demo.
    pub fn angle_at(&self, t: f64) -> f64 {
        self.config.amplitude_deg * (TAU * t / self.config.period_s).sin()
    }

    /// Build the frame for sweep time `t`, stamped with `timestamp_s`.
    fn frame_at(&self, t: f64, timestamp_s: f64) -> Frame {
        let phase = (t / self.config.period_s).rem_euclid(1.0);
        let input = if phase >= 1.0 - self.config.dropout_fraction {
            FrameInput::default()
        } else {
            let (left_open, right_open) = thumb_schedule(phase);
            let (left_wrist, right_wrist) = self.wrists(self.angle_at(t));
            FrameInput {
                left: Some(synthetic_pose(Hand::Left, left_wrist, left_open)),
                right: Some(synthetic_pose(Hand::Right, right_wrist, right_open)),
            }
        };
        Frame {
            input,
            width: self.config.width,
            height: self.config.height,
            timestamp_s,
        }
    }

    /// Normalized wrist positions for a wheel held at `angle_deg`.
    ///
    /// Placed in pixel space so the angle survives non-square frames.
    fn wrists(&self, angle_deg: f64) -> ((f32, f32), (f32, f32)) {
        let w = f64::from(self.config.width);
        let h = f64::from(self.config.height);
        let radius = WHEEL_RADIUS * w.min(h);
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let dx = radius * cos / w;
        let dy = radius * sin / h;
        (
            ((0.5 - dx) as f32, (0.5 - dy) as f32),
            ((0.5 + dx) as f32, (0.5 + dy) as f32),
        )
    }
}

/// A pose with every landmark on the wrist except an optionally extended thumb.
fn synthetic_pose(hand: Hand, wrist: (f32, f32), thumb_open: bool) -> HandPose {
    let mut landmarks = [Landmark::new(wrist.0, wrist.1, 0.0); LANDMARK_COUNT];
    if thumb_open {
        let outward = match hand {
            Hand::Left => THUMB_REACH,
            Hand::Right => -THUMB_REACH,
        };
        landmarks[HandLandmark::ThumbTip.index()].x = wrist.0 + outward;
    }
    HandPose::from_points(hand, landmarks)
}

impl PoseSource for DemoSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        if self.config.frame_count.is_some_and(|n| self.index >= n) {
            info!("Demo finished after {} frame(s)", self.index);
            return Ok(None);
        }

        let t = self.index as f64 / self.config.fps;
        let timestamp_s = if self.config.realtime {
            let started = *self.started.get_or_insert_with(Instant::now);
            let due = started + Duration::from_secs_f64(t);
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            started.elapsed().as_secs_f64()
        } else {
            t
        };

        let frame = self.frame_at(t, timestamp_s);
        self.index += 1;
        Ok(Some(frame))
    }
}
