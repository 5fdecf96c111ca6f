//! Screensaver child process shown while the session is locked.

use crate::config::SessionConfig;
use crate::core::shell::ScreenSaverControl;

use super::process::{ProcessCommand, ProcessSlot};

pub struct ScreenSaverProcess {
    slot: ProcessSlot,
}

impl ScreenSaverProcess {
    pub fn new(command: ProcessCommand) -> Self {
        Self {
            slot: ProcessSlot::new("screensaver", command),
        }
    }

    /// Screensaver from the session's configured command, stopped within
    /// the session's stop timeout.
    pub fn from_config(config: &SessionConfig) -> Self {
        let command = config
            .screensaver
            .clone()
            .env("XDG_RUNTIME_DIR", config.runtime_dir.display().to_string());
        Self {
            slot: ProcessSlot::new("screensaver", command).with_stop_timeout(config.stop_timeout),
        }
    }

    pub fn slot(&self) -> &ProcessSlot {
        &self.slot
    }
}

impl ScreenSaverControl for ScreenSaverProcess {
    fn launch(&mut self) {
        // An earlier instance may have exited on its own
        self.slot.try_reap();
        if self.slot.is_running() {
            return;
        }
        // Locking still works without a screensaver
        if let Err(e) = self.slot.start() {
            tracing::warn!("Screensaver unavailable: {}", e);
        }
    }

    fn terminate(&mut self) {
        self.slot.stop();
    }

    fn is_running(&self) -> bool {
        self.slot.is_running()
    }
}
