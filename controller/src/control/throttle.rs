//! Thumb poses to throttle/brake.

/// Pedal command for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleCommand {
    Accelerate,
    Brake,
    Idle,
}

impl ThrottleCommand {
    /// Left thumb accelerates and wins over the right thumb, which brakes.
    pub fn from_thumbs(left_thumb_open: bool, right_thumb_open: bool) -> Self {
        if left_thumb_open {
            Self::Accelerate
        } else if right_thumb_open {
            Self::Brake
        } else {
            Self::Idle
        }
    }

    /// Label for status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accelerate => "ACCELERATE",
            Self::Brake => "BRAKE",
            Self::Idle => "IDLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_thumbs_truth_table() {
        assert_eq!(ThrottleCommand::from_thumbs(false, false), ThrottleCommand::Idle);
        assert_eq!(ThrottleCommand::from_thumbs(true, false), ThrottleCommand::Accelerate);
        assert_eq!(ThrottleCommand::from_thumbs(false, true), ThrottleCommand::Brake);
    }

    #[test]
    fn test_accelerate_has_priority() {
        assert_eq!(ThrottleCommand::from_thumbs(true, true), ThrottleCommand::Accelerate);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(ThrottleCommand::Accelerate.as_str(), "ACCELERATE");
        assert_eq!(ThrottleCommand::Brake.as_str(), "BRAKE");
        assert_eq!(ThrottleCommand::Idle.as_str(), "IDLE");
    }
}
