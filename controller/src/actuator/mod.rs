//! Actuator subsystem: idempotent key-hold bookkeeping over a backend.
//!
//! Provides:
//! - `ActuatorSink`: tracks which of the four virtual keys are held and
//!   only forwards state changes to the backend
//! - `dry_run`: backend that reports key events through tracing
//! - `uinput`: Linux virtual keyboard backend (gated behind `uinput` feature)

pub mod dry_run;

#[cfg(feature = "uinput")]
pub mod uinput;

use tracing::{debug, warn};

use crate::control::{SteeringCommand, ThrottleCommand};

// ── Virtual keys ───────────────────────────────────────────

/// The four binary output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    SteerLeft,
    SteerRight,
    Throttle,
    Brake,
}

/// Number of virtual keys.
pub const KEY_COUNT: usize = 4;

impl VirtualKey {
    /// Every key, in release order.
    pub const ALL: [VirtualKey; KEY_COUNT] = [
        Self::SteerLeft,
        Self::SteerRight,
        Self::Throttle,
        Self::Brake,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SteerLeft => "steer-left",
            Self::SteerRight => "steer-right",
            Self::Throttle => "throttle",
            Self::Brake => "brake",
        }
    }

    /// The mutually exclusive partner of this key.
    pub fn opposite(&self) -> VirtualKey {
        match self {
            Self::SteerLeft => Self::SteerRight,
            Self::SteerRight => Self::SteerLeft,
            Self::Throttle => Self::Brake,
            Self::Brake => Self::Throttle,
        }
    }
}

// ── Backend ────────────────────────────────────────────────

/// Destination for key transitions.
pub trait KeyBackend {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Send a key-down event.
    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()>;

    /// Send a key-up event.
    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()>;
}

impl<B: KeyBackend + ?Sized> KeyBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        (**self).press(key)
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        (**self).release(key)
    }
}

/// Backend type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Log,
    Uinput,
}

/// Create the selected backend.
pub fn create(backend: BackendType) -> anyhow::Result<Box<dyn KeyBackend>> {
    match backend {
        BackendType::Log => Ok(Box::new(dry_run::LogBackend::new())),
        #[cfg(feature = "uinput")]
        BackendType::Uinput => Ok(Box::new(uinput::UinputBackend::new()?)),
        #[cfg(not(feature = "uinput"))]
        BackendType::Uinput => Err(anyhow::anyhow!(
            "uinput backend unavailable (compiled without 'uinput' feature)"
        )),
    }
}

// ── Sink ───────────────────────────────────────────────────

/// Held-key bookkeeping in front of a backend.
///
/// Steering keys and pedal keys are mutually exclusive pairs: the
/// partner is always released before a key is pressed, and a key is
/// never pressed while its partner is still held.
pub struct ActuatorSink<B: KeyBackend> {
    backend: B,
    held: [bool; KEY_COUNT],
    /// Key events delivered to the backend.
    pub events_sent: u64,
    /// Key events the backend rejected.
    pub events_failed: u64,
}

impl<B: KeyBackend> ActuatorSink<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            held: [false; KEY_COUNT],
            events_sent: 0,
            events_failed: 0,
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_held(&self, key: VirtualKey) -> bool {
        self.held[key.index()]
    }

    /// Keys currently held, in `VirtualKey::ALL` order.
    pub fn held_keys(&self) -> Vec<VirtualKey> {
        VirtualKey::ALL
            .iter()
            .copied()
            .filter(|k| self.is_held(*k))
            .collect()
    }

    /// Hold `key`. No-op if already held. Returns true if it is held afterwards.
    pub fn hold(&mut self, key: VirtualKey) -> bool {
        if self.is_held(key) {
            return true;
        }
        match self.backend.press(key) {
            Ok(()) => {
                self.held[key.index()] = true;
                self.events_sent += 1;
                debug!("{} down", key.as_str());
                true
            }
            Err(e) => {
                self.events_failed += 1;
                warn!("{} backend failed to press {}: {:#}", self.backend.name(), key.as_str(), e);
                false
            }
        }
    }

    /// Release `key`. No-op if not held. Returns true if it is released afterwards.
    pub fn release(&mut self, key: VirtualKey) -> bool {
        if !self.is_held(key) {
            return true;
        }
        match self.backend.release(key) {
            Ok(()) => {
                self.held[key.index()] = false;
                self.events_sent += 1;
                debug!("{} up", key.as_str());
                true
            }
            Err(e) => {
                self.events_failed += 1;
                warn!("{} backend failed to release {}: {:#}", self.backend.name(), key.as_str(), e);
                false
            }
        }
    }

    /// Release every key.
    pub fn release_all(&mut self) {
        for key in VirtualKey::ALL {
            self.release(key);
        }
    }

    /// Hold `key` after its partner is confirmed released.
    fn hold_exclusive(&mut self, key: VirtualKey) {
        if self.release(key.opposite()) {
            self.hold(key);
        }
    }

    pub fn apply_steering(&mut self, command: SteeringCommand) {
        match command {
            SteeringCommand::Left => self.hold_exclusive(VirtualKey::SteerLeft),
            SteeringCommand::Right => self.hold_exclusive(VirtualKey::SteerRight),
            SteeringCommand::Center => {
                self.release(VirtualKey::SteerLeft);
                self.release(VirtualKey::SteerRight);
            }
        }
    }

    pub fn apply_throttle(&mut self, command: ThrottleCommand) {
        match command {
            ThrottleCommand::Accelerate => self.hold_exclusive(VirtualKey::Throttle),
            ThrottleCommand::Brake => self.hold_exclusive(VirtualKey::Brake),
            ThrottleCommand::Idle => {
                self.release(VirtualKey::Throttle);
                self.release(VirtualKey::Brake);
            }
        }
    }

    /// Format held keys as an s-expression for status output.
    pub fn status_sexp(&self) -> String {
        let held = self.held_keys();
        let held = if held.is_empty() {
            "nil".to_string()
        } else {
            format!(
                "({})",
                held.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(" ")
            )
        };
        format!(
            "(:backend {} :held {} :events {} :failed {})",
            self.backend.name(),
            held,
            self.events_sent,
            self.events_failed
        )
    }
}

// ── Test backend ───────────────────────────────────────────

/// Records key transitions; can be told to reject keys.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// (key, pressed) in delivery order.
    pub events: Vec<(VirtualKey, bool)>,
    /// Keys whose events fail.
    pub failing: Vec<VirtualKey>,
    down: [bool; KEY_COUNT],
}

#[cfg(test)]
impl RecordingBackend {
    /// Whether the backend currently sees `key` as down.
    pub fn is_down(&self, key: VirtualKey) -> bool {
        self.down[key.index()]
    }

    fn record(&mut self, key: VirtualKey, pressed: bool) -> anyhow::Result<()> {
        if self.failing.contains(&key) {
            anyhow::bail!("injected failure");
        }
        self.events.push((key, pressed));
        self.down[key.index()] = pressed;
        // Pairs must never be down together at any instant.
        assert!(
            !(self.down[key.index()] && self.down[key.opposite().index()]),
            "{} and {} down together",
            key.as_str(),
            key.opposite().as_str()
        );
        Ok(())
    }
}

#[cfg(test)]
impl KeyBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.record(key, true)
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.record(key, false)
    }
}
