//! Steering controller: dead zone, normalization, smoothing, and
//! direction-reversal recovery.
//!
//! Turns the per-frame wheel angle into a signed steering value in
//! [-1, 1] and a left/right/center key command.  Recovery is a timed,
//! linearly decaying kick in the newly entered direction that starts
//! when the wheel crosses center from one side to the other between
//! readings.  While it runs, normal steering and throttle evaluation
//! are both skipped.

use tracing::{debug, trace};

// ── Direction ──────────────────────────────────────────────

/// Which side of the dead zone an angle falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Neutral,
    Right,
}

impl Direction {
    /// Classify an angle against a symmetric dead zone.
    pub fn from_angle(angle_deg: f64, dead_zone_deg: f64) -> Self {
        if angle_deg > dead_zone_deg {
            Self::Right
        } else if angle_deg < -dead_zone_deg {
            Self::Left
        } else {
            Self::Neutral
        }
    }

    /// -1.0, 0.0 or 1.0.
    pub fn signum(&self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Neutral => 0.0,
            Self::Right => 1.0,
        }
    }

    /// True when both are non-neutral and point opposite ways.
    pub fn is_reversal_of(&self, previous: Direction) -> bool {
        matches!(
            (previous, *self),
            (Self::Left, Self::Right) | (Self::Right, Self::Left)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Neutral => "neutral",
            Self::Right => "right",
        }
    }
}

// ── Commands ───────────────────────────────────────────────

/// Steering key command derived from the sign of the steering value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringCommand {
    Left,
    Right,
    Center,
}

impl SteeringCommand {
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            Self::Right
        } else if value < 0.0 {
            Self::Left
        } else {
            Self::Center
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Steering tuning, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringConfig {
    /// Angles with magnitude at or below this (degrees) steer straight.
    pub dead_zone_deg: f64,
    /// Angle magnitude (degrees) at which steering saturates at 100%.
    pub max_angle_deg: f64,
    /// Weight of the previous frame's value, in [0, 1). 0 = no smoothing.
    pub smoothing: f64,
    /// Recovery strength at the moment of reversal, in [0, 1].
    pub recovery_factor: f64,
    /// Seconds over which the recovery kick decays to zero.
    pub recovery_duration_s: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            dead_zone_deg: 20.0,
            max_angle_deg: 60.0,
            smoothing: 0.0,
            recovery_factor: 0.0,
            recovery_duration_s: 0.0,
        }
    }
}

impl SteeringConfig {
    /// Check ranges. Returns `Err` describing the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("dead-zone", self.dead_zone_deg),
            ("max-angle", self.max_angle_deg),
            ("smoothing", self.smoothing),
            ("recovery-factor", self.recovery_factor),
            ("recovery-duration", self.recovery_duration_s),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite, got {}", name, value));
        }
        if self.dead_zone_deg < 0.0 {
            return Err(format!("dead-zone must be >= 0, got {}", self.dead_zone_deg));
        }
        if self.max_angle_deg <= self.dead_zone_deg {
            return Err(format!(
                "max-angle ({}) must be greater than dead-zone ({})",
                self.max_angle_deg, self.dead_zone_deg
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!("smoothing must be in [0, 1), got {}", self.smoothing));
        }
        if !(0.0..=1.0).contains(&self.recovery_factor) {
            return Err(format!(
                "recovery-factor must be in [0, 1], got {}",
                self.recovery_factor
            ));
        }
        if self.recovery_duration_s < 0.0 {
            return Err(format!(
                "recovery-duration must be >= 0, got {}",
                self.recovery_duration_s
            ));
        }
        Ok(())
    }

    /// Format config as an s-expression for status output.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:dead-zone {:.1} :max-angle {:.1} :smoothing {:.2} :recovery-factor {:.2} :recovery-duration {:.2})",
            self.dead_zone_deg,
            self.max_angle_deg,
            self.smoothing,
            self.recovery_factor,
            self.recovery_duration_s,
        )
    }
}

// ── State ──────────────────────────────────────────────────

/// An active recovery window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recovery {
    /// Direction of the kick (the newly entered direction).
    pub direction: Direction,
    /// Timestamp (seconds) the reversal was detected.
    pub started_at_s: f64,
}

/// Persistent steering state, mutated once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringState {
    /// Last emitted steering value in [-1, 1].
    pub current_steering: f64,
    /// Last non-neutral direction seen.
    pub last_direction: Direction,
    /// Active recovery window, if any.
    pub recovery: Option<Recovery>,
}

impl Default for SteeringState {
    fn default() -> Self {
        Self {
            current_steering: 0.0,
            last_direction: Direction::Neutral,
            recovery: None,
        }
    }
}

/// Controller phase after a frame's update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringPhase {
    Straight,
    Steering { value: f64 },
    Recovering { value: f64, started_at_s: f64 },
}

/// Result of one steering update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub phase: SteeringPhase,
    pub command: SteeringCommand,
    /// Signed steering value in [-1, 1].
    pub value: f64,
}

impl SteeringOutput {
    /// Recovery frames skip throttle evaluation.
    pub fn is_recovering(&self) -> bool {
        matches!(self.phase, SteeringPhase::Recovering { .. })
    }

    /// Human-readable label, e.g. "RIGHT (75%)" or "RECOVERY LEFT (40%)".
    pub fn label(&self) -> String {
        let percent = (self.value.abs() * 100.0) as i64;
        let side = if self.value < 0.0 { "LEFT" } else { "RIGHT" };
        match self.phase {
            SteeringPhase::Straight => "STRAIGHT".to_string(),
            SteeringPhase::Steering { .. } if self.value == 0.0 => "STRAIGHT".to_string(),
            SteeringPhase::Steering { .. } => format!("{} ({}%)", side, percent),
            SteeringPhase::Recovering { .. } => format!("RECOVERY {} ({}%)", side, percent),
        }
    }
}

// ── Controller ─────────────────────────────────────────────

/// Stateful steering controller.
#[derive(Debug, Clone)]
pub struct SteeringController {
    pub config: SteeringConfig,
    state: SteeringState,
}

impl SteeringController {
    pub fn new(config: SteeringConfig) -> Self {
        Self {
            config,
            state: SteeringState::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SteeringState {
        &self.state
    }

    /// Whether a recovery window is open.
    pub fn is_recovering(&self) -> bool {
        self.state.recovery.is_some()
    }

    /// Forget all steering history.
    pub fn reset(&mut self) {
        self.state = SteeringState::default();
    }

    /// Advance one frame with the wheel angle measured at `now_s`.
    pub fn update(&mut self, angle_deg: f64, now_s: f64) -> SteeringOutput {
        let direction = Direction::from_angle(angle_deg, self.config.dead_zone_deg);

        if direction.is_reversal_of(self.state.last_direction) {
            debug!(
                "Steering reversed {} -> {} at {:.3}s, entering recovery",
                self.state.last_direction.as_str(),
                direction.as_str(),
                now_s
            );
            self.state.recovery = Some(Recovery {
                direction,
                started_at_s: now_s,
            });
        }

        if direction != Direction::Neutral {
            self.state.last_direction = direction;
        }

        if let Some(recovery) = self.state.recovery {
            // Clamped so a clock step backwards cannot overshoot the factor.
            let elapsed = (now_s - recovery.started_at_s).max(0.0);
            if elapsed < self.config.recovery_duration_s {
                let strength = self.config.recovery_factor
                    * (1.0 - elapsed / self.config.recovery_duration_s);
                let value = recovery.direction.signum() * strength;
                self.state.current_steering = value;
                trace!("recovery {} strength {:.3}", recovery.direction.as_str(), strength);
                return SteeringOutput {
                    phase: SteeringPhase::Recovering {
                        value,
                        started_at_s: recovery.started_at_s,
                    },
                    command: SteeringCommand::from_value(value),
                    value,
                };
            }
            debug!("Recovery expired after {:.3}s", elapsed);
            self.state.recovery = None;
        }

        self.steer_normally(angle_deg)
    }

    fn steer_normally(&mut self, angle_deg: f64) -> SteeringOutput {
        let magnitude = angle_deg.abs();
        if magnitude <= self.config.dead_zone_deg {
            self.state.current_steering = 0.0;
            return SteeringOutput {
                phase: SteeringPhase::Straight,
                command: SteeringCommand::Center,
                value: 0.0,
            };
        }

        let normalized = magnitude.min(self.config.max_angle_deg) / self.config.max_angle_deg;
        let target = angle_deg.signum() * normalized;
        let alpha = self.config.smoothing;
        let value = (1.0 - alpha) * target + alpha * self.state.current_steering;
        if value == 0.0 {
            // Smoothing cancelled the target out exactly.
            self.state.current_steering = 0.0;
            return SteeringOutput {
                phase: SteeringPhase::Straight,
                command: SteeringCommand::Center,
                value: 0.0,
            };
        }
        self.state.current_steering = value;

        SteeringOutput {
            phase: SteeringPhase::Steering { value },
            command: SteeringCommand::from_value(value),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_recovery(factor: f64, duration_s: f64) -> SteeringController {
        SteeringController::new(SteeringConfig {
            recovery_factor: factor,
            recovery_duration_s: duration_s,
            ..SteeringConfig::default()
        })
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SteeringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dead_zone_deg, 20.0);
        assert_eq!(config.max_angle_deg, 60.0);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let bad = [
            SteeringConfig { dead_zone_deg: -1.0, ..SteeringConfig::default() },
            SteeringConfig { max_angle_deg: 20.0, ..SteeringConfig::default() },
            SteeringConfig { smoothing: 1.0, ..SteeringConfig::default() },
            SteeringConfig { recovery_factor: 1.5, ..SteeringConfig::default() },
            SteeringConfig { recovery_duration_s: -0.1, ..SteeringConfig::default() },
            SteeringConfig { max_angle_deg: f64::NAN, ..SteeringConfig::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn test_straight_at_zero() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        let out = ctl.update(0.0, 0.0);
        assert_eq!(out.phase, SteeringPhase::Straight);
        assert_eq!(out.command, SteeringCommand::Center);
        assert_eq!(ctl.state().current_steering, 0.0);
        assert_eq!(out.label(), "STRAIGHT");
    }

    #[test]
    fn test_dead_zone_boundary_is_straight() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        for angle in [-20.0, -19.9, -5.0, 5.0, 19.9, 20.0] {
            let out = ctl.update(angle, 0.0);
            assert_eq!(out.value, 0.0, "angle {}", angle);
            assert_eq!(out.command, SteeringCommand::Center);
        }
    }

    #[test]
    fn test_partial_right() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        let out = ctl.update(45.0, 0.0);
        assert!((out.value - 0.75).abs() < 1e-12);
        assert_eq!(out.command, SteeringCommand::Right);
        assert_eq!(out.label(), "RIGHT (75%)");
    }

    #[test]
    fn test_saturates_left() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        let out = ctl.update(-70.0, 0.0);
        assert_eq!(out.value, -1.0);
        assert_eq!(out.command, SteeringCommand::Left);
        assert_eq!(out.label(), "LEFT (100%)");
    }

    #[test]
    fn test_saturation_is_exact() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        for angle in [60.0, 61.0, 90.0, 179.0, 180.0] {
            ctl.reset();
            assert_eq!(ctl.update(angle, 0.0).value, 1.0, "angle {}", angle);
            ctl.reset();
            assert_eq!(ctl.update(-angle, 0.0).value, -1.0, "angle {}", -angle);
        }
    }

    #[test]
    fn test_smoothing_blends_previous() {
        let mut ctl = SteeringController::new(SteeringConfig {
            smoothing: 0.5,
            ..SteeringConfig::default()
        });
        let first = ctl.update(60.0, 0.0);
        assert!((first.value - 0.5).abs() < 1e-12);
        let second = ctl.update(60.0, 0.1);
        assert!((second.value - 0.75).abs() < 1e-12);
        // Dead zone snaps straight to zero regardless of smoothing.
        let third = ctl.update(0.0, 0.2);
        assert_eq!(third.value, 0.0);
    }

    #[test]
    fn test_smoothing_cancelling_out_is_straight() {
        let mut ctl = SteeringController::new(SteeringConfig {
            smoothing: 0.5,
            ..SteeringConfig::default()
        });
        assert_eq!(ctl.update(-60.0, 0.0).value, -0.5);
        // Right of the dead zone, but blended with -0.5 it lands on zero.
        let out = ctl.update(30.0, 0.1);
        assert_eq!(out.value, 0.0);
        assert_eq!(out.command, SteeringCommand::Center);
        assert_eq!(out.phase, SteeringPhase::Straight);
        assert_eq!(out.label(), "STRAIGHT");
        assert_eq!(ctl.state().current_steering, 0.0);
    }

    #[test]
    fn test_label_of_zero_steering_is_straight() {
        let out = SteeringOutput {
            phase: SteeringPhase::Steering { value: 0.0 },
            command: SteeringCommand::Center,
            value: 0.0,
        };
        assert_eq!(out.label(), "STRAIGHT");
        let out = SteeringOutput {
            phase: SteeringPhase::Steering { value: -0.004 },
            command: SteeringCommand::Left,
            value: -0.004,
        };
        assert_eq!(out.label(), "LEFT (0%)");
    }

    #[test]
    fn test_output_stays_bounded() {
        let mut ctl = SteeringController::new(SteeringConfig {
            smoothing: 0.7,
            recovery_factor: 1.0,
            recovery_duration_s: 0.3,
            ..SteeringConfig::default()
        });
        let mut t = 0.0;
        for i in 0..2000 {
            let angle = ((i as f64) * 0.37).sin() * 180.0;
            let out = ctl.update(angle, t);
            assert!((-1.0..=1.0).contains(&out.value), "value {} at {}", out.value, i);
            t += 0.016;
        }
    }

    #[test]
    fn test_reversal_enters_recovery_in_new_direction() {
        let mut ctl = with_recovery(0.6, 0.5);
        ctl.update(45.0, 1.0);
        assert_eq!(ctl.state().last_direction, Direction::Right);

        let out = ctl.update(-45.0, 1.1);
        assert!(out.is_recovering());
        assert_eq!(out.command, SteeringCommand::Left);
        assert!((out.value + 0.6).abs() < 1e-12);
        let recovery = ctl.state().recovery.unwrap();
        assert_eq!(recovery.direction, Direction::Left);
        assert_eq!(recovery.started_at_s, 1.1);
        assert_eq!(ctl.state().last_direction, Direction::Left);
        assert_eq!(out.label(), "RECOVERY LEFT (60%)");
    }

    #[test]
    fn test_recovery_decays_linearly() {
        let mut ctl = with_recovery(0.8, 1.0);
        ctl.update(-45.0, 0.0);
        let start = ctl.update(45.0, 10.0);
        assert!((start.value - 0.8).abs() < 1e-12);

        let mut previous = start.value;
        for step in 1..10 {
            let t = 10.0 + step as f64 * 0.1;
            let out = ctl.update(45.0, t);
            assert!(out.is_recovering());
            assert!(out.value < previous, "not decreasing at step {}", step);
            let expected = 0.8 * (1.0 - step as f64 * 0.1);
            assert!((out.value - expected).abs() < 1e-9);
            previous = out.value;
        }
    }

    #[test]
    fn test_recovery_expiry_falls_through_same_frame() {
        let mut ctl = with_recovery(0.8, 0.5);
        ctl.update(45.0, 0.0);
        assert!(ctl.update(-45.0, 1.0).is_recovering());

        let out = ctl.update(-30.0, 1.5);
        assert!(!out.is_recovering());
        assert!(!ctl.is_recovering());
        assert!((out.value + 0.5).abs() < 1e-12);
        assert_eq!(out.command, SteeringCommand::Left);
    }

    #[test]
    fn test_zero_duration_recovery_is_inert() {
        let mut ctl = SteeringController::new(SteeringConfig::default());
        ctl.update(45.0, 0.0);
        let out = ctl.update(-45.0, 0.1);
        assert!(!out.is_recovering());
        assert!(!ctl.is_recovering());
        assert!((out.value + 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_dead_zone_does_not_break_recovery() {
        let mut ctl = with_recovery(0.5, 1.0);
        ctl.update(45.0, 0.0);
        ctl.update(-45.0, 0.0);
        let out = ctl.update(0.0, 0.5);
        assert!(out.is_recovering());
        assert!((out.value + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_between_sides_still_reverses() {
        // last_direction survives neutral frames.
        let mut ctl = with_recovery(0.5, 1.0);
        ctl.update(45.0, 0.0);
        ctl.update(0.0, 0.1);
        let out = ctl.update(-45.0, 0.2);
        assert!(out.is_recovering());
    }

    #[test]
    fn test_second_reversal_restarts_recovery() {
        let mut ctl = with_recovery(0.5, 1.0);
        ctl.update(45.0, 0.0);
        ctl.update(-45.0, 0.0);
        let out = ctl.update(45.0, 0.4);
        assert!(out.is_recovering());
        assert_eq!(out.command, SteeringCommand::Right);
        assert!((out.value - 0.5).abs() < 1e-12);
        assert_eq!(ctl.state().recovery.unwrap().started_at_s, 0.4);
    }

    #[test]
    fn test_same_side_does_not_trigger_recovery() {
        let mut ctl = with_recovery(0.5, 1.0);
        ctl.update(30.0, 0.0);
        let out = ctl.update(59.0, 0.1);
        assert!(!out.is_recovering());
    }

    #[test]
    fn test_clock_going_backwards_is_clamped() {
        let mut ctl = with_recovery(1.0, 0.5);
        ctl.update(45.0, 5.0);
        ctl.update(-45.0, 5.0);
        let out = ctl.update(-45.0, 4.0);
        assert!(out.is_recovering());
        assert_eq!(out.value, -1.0);
    }

    #[test]
    fn test_zero_factor_recovery_centers_wheel() {
        let mut ctl = with_recovery(0.0, 1.0);
        ctl.update(45.0, 0.0);
        let out = ctl.update(-45.0, 0.1);
        assert!(out.is_recovering());
        assert_eq!(out.command, SteeringCommand::Center);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ctl = with_recovery(0.5, 1.0);
        ctl.update(45.0, 0.0);
        ctl.update(-45.0, 0.0);
        ctl.reset();
        assert_eq!(*ctl.state(), SteeringState::default());
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::from_angle(21.0, 20.0), Direction::Right);
        assert_eq!(Direction::from_angle(-21.0, 20.0), Direction::Left);
        assert_eq!(Direction::from_angle(20.0, 20.0), Direction::Neutral);
        assert!(Direction::Left.is_reversal_of(Direction::Right));
        assert!(!Direction::Left.is_reversal_of(Direction::Neutral));
        assert!(!Direction::Neutral.is_reversal_of(Direction::Right));
        assert_eq!(Direction::Left.signum(), -1.0);
    }

    #[test]
    fn test_config_sexp() {
        let sexp = SteeringConfig::default().to_sexp();
        assert!(sexp.contains(":dead-zone 20.0"));
        assert!(sexp.contains(":max-angle 60.0"));
        assert!(sexp.contains(":recovery-duration 0.00"));
    }
}
