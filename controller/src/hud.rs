//! Driver HUD: the per-frame readout a human watches while tuning.
//!
//! Output only; nothing here feeds back into control decisions.

use crate::control::ThrottleCommand;
use crate::drive::FrameOutcome;

/// Steering label shown while either hand is missing.
pub const WAITING_LABEL: &str = "WAITING FOR BOTH HANDS";

/// Last frame's readout.
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    /// Wheel angle, truncated to whole degrees for display.
    pub angle_deg: i64,
    pub steering_label: String,
    pub throttle_label: &'static str,
    /// A recovery window is open, even if this frame had no hands.
    pub recovery_mode: bool,
    pub fps: f64,
    pub hands: usize,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            angle_deg: 0,
            steering_label: WAITING_LABEL.to_string(),
            throttle_label: ThrottleCommand::Idle.as_str(),
            recovery_mode: false,
            fps: 0.0,
            hands: 0,
        }
    }
}

impl Hud {
    /// Refresh from one frame's outcome.
    ///
    /// Throttle reads IDLE on frames that skipped throttle evaluation,
    /// whatever the pedal keys are doing.
    pub fn observe(&mut self, outcome: &FrameOutcome, recovery_mode: bool, fps: f64) {
        *self = Self {
            recovery_mode,
            fps,
            ..Self::default()
        };
        match outcome {
            FrameOutcome::HandsMissing { hands } => {
                self.hands = *hands;
            }
            FrameOutcome::Recovering { reading, steering } => {
                self.hands = 2;
                self.angle_deg = reading.angle_deg as i64;
                self.steering_label = steering.label();
            }
            FrameOutcome::Driving {
                reading,
                steering,
                throttle,
            } => {
                self.hands = 2;
                self.angle_deg = reading.angle_deg as i64;
                self.steering_label = steering.label();
                self.throttle_label = throttle.as_str();
            }
        }
    }

    /// One-line text rendering for logs.
    pub fn line(&self) -> String {
        let mut line = format!(
            "FPS: {} | Angle: {}° | Steer: {} | Throttle: {}",
            self.fps as i64, self.angle_deg, self.steering_label, self.throttle_label
        );
        if self.recovery_mode {
            line.push_str(" | RECOVERY MODE");
        }
        line
    }

    /// Format the readout as an s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:angle {} :steer \"{}\" :throttle \"{}\" :recovery {} :hands {} :fps {:.0})",
            self.angle_deg,
            self.steering_label,
            self.throttle_label,
            if self.recovery_mode { "t" } else { "nil" },
            self.hands,
            self.fps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::steering::SteeringPhase;
    use crate::control::{SteeringCommand, SteeringOutput};
    use crate::hand::WheelReading;

    fn reading(angle_deg: f64) -> WheelReading {
        WheelReading {
            angle_deg,
            left_thumb_open: true,
            right_thumb_open: false,
        }
    }

    #[test]
    fn test_default_is_waiting() {
        let hud = Hud::default();
        assert_eq!(hud.steering_label, WAITING_LABEL);
        assert_eq!(hud.throttle_label, "IDLE");
        assert!(!hud.recovery_mode);
    }

    #[test]
    fn test_observe_driving() {
        let mut hud = Hud::default();
        let outcome = FrameOutcome::Driving {
            reading: reading(45.7),
            steering: SteeringOutput {
                phase: SteeringPhase::Steering { value: 0.75 },
                command: SteeringCommand::Right,
                value: 0.75,
            },
            throttle: ThrottleCommand::Accelerate,
        };
        hud.observe(&outcome, false, 29.6);
        assert_eq!(hud.angle_deg, 45);
        assert_eq!(hud.steering_label, "RIGHT (75%)");
        assert_eq!(hud.throttle_label, "ACCELERATE");
        assert_eq!(hud.line(), "FPS: 29 | Angle: 45° | Steer: RIGHT (75%) | Throttle: ACCELERATE");
    }

    #[test]
    fn test_observe_recovering_shows_idle_throttle() {
        let mut hud = Hud::default();
        let outcome = FrameOutcome::Recovering {
            reading: reading(-45.0),
            steering: SteeringOutput {
                phase: SteeringPhase::Recovering {
                    value: -0.4,
                    started_at_s: 1.0,
                },
                command: SteeringCommand::Left,
                value: -0.4,
            },
        };
        hud.observe(&outcome, true, 30.0);
        assert_eq!(hud.steering_label, "RECOVERY LEFT (40%)");
        assert_eq!(hud.throttle_label, "IDLE");
        assert!(hud.line().ends_with("| RECOVERY MODE"));
    }

    #[test]
    fn test_observe_hands_missing_resets_readout() {
        let mut hud = Hud {
            angle_deg: 30,
            steering_label: "RIGHT (50%)".to_string(),
            throttle_label: "BRAKE",
            ..Hud::default()
        };
        hud.observe(&FrameOutcome::HandsMissing { hands: 1 }, true, 15.0);
        assert_eq!(hud.angle_deg, 0);
        assert_eq!(hud.steering_label, WAITING_LABEL);
        assert_eq!(hud.throttle_label, "IDLE");
        assert_eq!(hud.hands, 1);
        assert!(hud.recovery_mode);
    }

    #[test]
    fn test_status_sexp_parses() {
        let hud = Hud::default();
        let sexp = hud.status_sexp();
        assert_eq!(
            sexp,
            "(:angle 0 :steer \"WAITING FOR BOTH HANDS\" :throttle \"IDLE\" :recovery nil :hands 0 :fps 0)"
        );
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}
