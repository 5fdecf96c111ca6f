//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::errors::{Result, SessionError};
use crate::session::process::{ProcessCommand, DEFAULT_STOP_TIMEOUT};

/// Control-loop tick used to notice child exits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for the session supervisor
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run inside a helper display server instead of on the host display.
    pub nested: bool,
    /// Directory holding Wayland sockets.
    pub runtime_dir: PathBuf,
    /// Helper display server used when nested.
    pub helper: ProcessCommand,
    pub compositor: ProcessCommand,
    pub screensaver: ProcessCommand,
    /// Bound on graceful process shutdown before a kill.
    pub stop_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            nested: false,
            runtime_dir: PathBuf::from("/run/user/0"),
            helper: ProcessCommand::new("weston").arg("--shell=fullscreen-shell.so"),
            compositor: ProcessCommand::new("hawaii").args([
                "-platformtheme",
                "Hawaii",
                "-p",
                "org.hawaii.desktop",
            ]),
            screensaver: ProcessCommand::new("hawaii-screensaver"),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Defaults with the runtime directory taken from `XDG_RUNTIME_DIR`.
    pub fn from_env() -> Result<Self> {
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .ok_or(SessionError::MissingRuntimeDir)?;

        Ok(Self {
            runtime_dir,
            ..Default::default()
        })
    }

    pub fn with_runtime_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.runtime_dir = dir.into();
        self
    }

    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }
}
