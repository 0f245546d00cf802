//! uinput backend: a virtual keyboard the simulator reads like a real one.
//!
//! Steering maps to A/D and the pedals to W/S, the default driving keys
//! of most PC racing games.

use anyhow::Context;
use evdev::{
    uinput::VirtualDevice, AttributeSet, BusType, EventType, InputEvent, InputId, KeyCode,
    SynchronizationCode,
};
use tracing::info;

use super::{KeyBackend, VirtualKey};

fn key_code(key: VirtualKey) -> KeyCode {
    match key {
        VirtualKey::SteerLeft => KeyCode::KEY_A,
        VirtualKey::SteerRight => KeyCode::KEY_D,
        VirtualKey::Throttle => KeyCode::KEY_W,
        VirtualKey::Brake => KeyCode::KEY_S,
    }
}

/// Virtual keyboard exposing only the four driving keys.
pub struct UinputBackend {
    device: VirtualDevice,
}

impl UinputBackend {
    pub fn new() -> anyhow::Result<Self> {
        let mut keys = AttributeSet::<KeyCode>::new();
        for key in VirtualKey::ALL {
            keys.insert(key_code(key));
        }

        let device = VirtualDevice::builder()
            .context("failed to open /dev/uinput")?
            .name("handwheel virtual keyboard")
            .input_id(InputId::new(BusType::BUS_VIRTUAL, 0x1209, 0x5757, 1))
            .with_keys(&keys)
            .context("failed to register driving keys")?
            .build()
            .context("failed to create uinput device")?;

        info!("Key output: uinput virtual keyboard (A/D steer, W/S pedals)");
        Ok(Self { device })
    }

    fn emit(&mut self, key: VirtualKey, value: i32) -> anyhow::Result<()> {
        let events = [
            InputEvent::new(EventType::KEY.0, key_code(key).0, value),
            InputEvent::new(EventType::SYNCHRONIZATION.0, SynchronizationCode::SYN_REPORT.0, 0),
        ];
        self.device
            .emit(&events)
            .with_context(|| format!("uinput write for {} failed", key.as_str()))
    }
}

impl KeyBackend for UinputBackend {
    fn name(&self) -> &'static str {
        "uinput"
    }

    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.emit(key, 1)
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.emit(key, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes_are_distinct() {
        let codes: Vec<u16> = VirtualKey::ALL.iter().map(|k| key_code(*k).0).collect();
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(key_code(VirtualKey::Throttle), KeyCode::KEY_W);
    }
}
