//! Control subsystem: turns a wheel reading into key commands.
//!
//! Provides:
//! - `steering`: dead zone, smoothing, and the recovery state machine
//! - `throttle`: stateless thumb-to-pedal mapping

pub mod steering;
pub mod throttle;

pub use steering::{SteeringCommand, SteeringConfig, SteeringController, SteeringOutput};
pub use throttle::ThrottleCommand;
