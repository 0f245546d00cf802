//! Dry-run backend: reports key transitions through tracing instead of
//! touching an input device.

use tracing::info;

use super::{KeyBackend, VirtualKey};

/// Logs every key transition at info level.
#[derive(Debug, Default)]
pub struct LogBackend {
    presses: u64,
    releases: u64,
}

impl LogBackend {
    pub fn new() -> Self {
        info!("Key output: dry run (events are logged only)");
        Self::default()
    }

    /// (presses, releases) seen so far.
    #[cfg(test)]
    pub fn counts(&self) -> (u64, u64) {
        (self.presses, self.releases)
    }
}

impl Drop for LogBackend {
    fn drop(&mut self) {
        info!("Dry run done: {} key press(es), {} release(s)", self.presses, self.releases);
    }
}

impl KeyBackend for LogBackend {
    fn name(&self) -> &'static str {
        "log"
    }

    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.presses += 1;
        info!(key = key.as_str(), "key down");
        Ok(())
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.releases += 1;
        info!(key = key.as_str(), "key up");
        Ok(())
    }
}
