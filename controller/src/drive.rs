//! Control loop: pulls frames from a pose source and drives the keys.
//!
//! Per frame: wheel reading → steering → throttle (skipped while
//! recovering) → actuator.  Losing either hand releases every key.
//! However the loop ends, every key is released before `run` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::actuator::{ActuatorSink, KeyBackend};
use crate::control::{SteeringConfig, SteeringController, SteeringOutput, ThrottleCommand};
use crate::frame_timing::FrameTiming;
use crate::hand::{AngleExtractor, Frame, WheelConfig, WheelReading};
use crate::hud::Hud;
use crate::source::PoseSource;

// ── Shutdown signal ────────────────────────────────────────

/// Global flag set by SIGTERM/SIGINT handlers.
pub static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

// ── Configuration ──────────────────────────────────────────

/// Loop lifetime and status reporting.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Stop after this much wall-clock time.
    pub exit_after: Option<Duration>,
    /// Interval between status log lines; `None` disables them.
    pub status_interval: Option<Duration>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            exit_after: None,
            status_interval: Some(Duration::from_secs(5)),
        }
    }
}

impl LoopConfig {
    /// Build from command-line seconds. A zero status interval disables
    /// status lines.
    pub fn from_secs(exit_after_s: Option<f64>, status_interval_s: u64) -> Result<Self, String> {
        let exit_after = match exit_after_s {
            Some(secs) if secs < 0.0 => {
                return Err(format!("exit-after must not be negative, got {}", secs));
            }
            Some(secs) => Some(
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| format!("exit-after {}: {}", secs, e))?,
            ),
            None => None,
        };
        Ok(Self {
            exit_after,
            status_interval: (status_interval_s > 0).then(|| Duration::from_secs(status_interval_s)),
        })
    }
}

// ── Outcomes ───────────────────────────────────────────────

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Fewer than two hands; every key was released.
    HandsMissing { hands: usize },
    /// Recovery steering applied; throttle left untouched.
    Recovering {
        reading: WheelReading,
        steering: SteeringOutput,
    },
    /// Normal steering and throttle applied.
    Driving {
        reading: WheelReading,
        steering: SteeringOutput,
        throttle: ThrottleCommand,
    },
}

impl FrameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandsMissing { .. } => "hands-missing",
            Self::Recovering { .. } => "recovering",
            Self::Driving { .. } => "driving",
        }
    }
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    Timer,
    EndOfStream,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Timer => "exit-timer",
            Self::EndOfStream => "end-of-stream",
        }
    }
}

// ── Loop ───────────────────────────────────────────────────

/// Owns all per-session control state.
pub struct ControlLoop<B: KeyBackend> {
    extractor: AngleExtractor,
    steering: SteeringController,
    sink: ActuatorSink<B>,
    timing: FrameTiming,
    hud: Hud,
    tracking: bool,
    /// Frames processed.
    pub frames: u64,
    /// Frames that skipped throttle for recovery.
    pub recovery_frames: u64,
}

impl<B: KeyBackend> ControlLoop<B> {
    pub fn new(wheel: WheelConfig, steering: SteeringConfig, backend: B) -> Self {
        Self {
            extractor: AngleExtractor::new(wheel),
            steering: SteeringController::new(steering),
            sink: ActuatorSink::new(backend),
            timing: FrameTiming::default(),
            hud: Hud::default(),
            tracking: false,
            frames: 0,
            recovery_frames: 0,
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &ActuatorSink<B> {
        &self.sink
    }

    #[cfg(test)]
    pub fn steering(&self) -> &SteeringController {
        &self.steering
    }

    #[cfg(test)]
    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    /// Process one frame.
    pub fn step(&mut self, frame: &Frame) -> FrameOutcome {
        self.frames += 1;
        self.timing.record_frame(frame.timestamp_s);
        let outcome = self.drive(frame);
        if matches!(outcome, FrameOutcome::Recovering { .. }) {
            self.recovery_frames += 1;
        }
        self.hud
            .observe(&outcome, self.steering.is_recovering(), self.timing.fps());
        trace!("{}", self.hud.line());
        outcome
    }

    fn drive(&mut self, frame: &Frame) -> FrameOutcome {
        let Some((left, right)) = frame.input.both() else {
            if self.tracking {
                info!("Hand tracking lost, releasing all keys");
                self.tracking = false;
            }
            self.sink.release_all();
            return FrameOutcome::HandsMissing {
                hands: frame.input.hand_count(),
            };
        };
        if !self.tracking {
            info!("Both hands tracked");
            self.tracking = true;
        }

        let reading = self.extractor.extract(left, right, frame.width, frame.height);
        let steering = self.steering.update(reading.angle_deg, frame.timestamp_s);
        trace!(command = steering.command.as_str(), value = steering.value, "steering");
        self.sink.apply_steering(steering.command);

        if steering.is_recovering() {
            return FrameOutcome::Recovering { reading, steering };
        }

        let throttle = ThrottleCommand::from_thumbs(reading.left_thumb_open, reading.right_thumb_open);
        self.sink.apply_throttle(throttle);
        FrameOutcome::Driving {
            reading,
            steering,
            throttle,
        }
    }

    /// Run until `shutdown` is set, the exit timer fires, or the source ends.
    ///
    /// Steering starts from rest. All keys are released before returning,
    /// including when the source fails.
    pub fn run<S: PoseSource + ?Sized>(
        &mut self,
        source: &mut S,
        shutdown: &AtomicBool,
        config: &LoopConfig,
    ) -> anyhow::Result<StopReason> {
        info!("Control loop running (source: {})", source.name());
        self.steering.reset();
        let result = self.pump(source, shutdown, config);
        self.sink.release_all();
        info!(
            "Control loop stopped after {} frame(s) ({} in recovery): {}",
            self.frames,
            self.recovery_frames,
            self.sink.status_sexp()
        );
        result
    }

    fn pump<S: PoseSource + ?Sized>(
        &mut self,
        source: &mut S,
        shutdown: &AtomicBool,
        config: &LoopConfig,
    ) -> anyhow::Result<StopReason> {
        let start_time = Instant::now();
        let mut last_status_log = Instant::now();

        loop {
            // Check global shutdown flag (set by signal handler)
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown signal received, exiting");
                return Ok(StopReason::Signal);
            }

            if let Some(dur) = config.exit_after {
                if start_time.elapsed() >= dur {
                    info!("Exit timer fired after {:.1}s", dur.as_secs_f64());
                    return Ok(StopReason::Timer);
                }
            }

            let Some(frame) = source.next_frame()? else {
                info!("Pose source '{}' ended", source.name());
                return Ok(StopReason::EndOfStream);
            };
            let outcome = self.step(&frame);
            debug!(frame = self.frames, outcome = outcome.as_str(), "{}", self.hud.line());

            if let Some(interval) = config.status_interval {
                if last_status_log.elapsed() >= interval {
                    info!("Status: {}", self.status_sexp());
                    last_status_log = Instant::now();
                }
            }
        }
    }

    /// Format the whole loop state as an s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:frames {} :recovery-frames {} :hud {} :keys {} :timing {})",
            self.frames,
            self.recovery_frames,
            self.hud.status_sexp(),
            self.sink.status_sexp(),
            self.timing.stats_sexp(),
        )
    }
}
