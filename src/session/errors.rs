//! Session error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while bringing the session pipeline up.
///
/// All of these are fatal: there is no degraded mode without a display.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch {name}: {source}")]
    LaunchFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Socket watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Runtime directory does not exist: {}", .0.display())]
    RuntimeDirMissing(PathBuf),

    #[error("XDG_RUNTIME_DIR is not set")]
    MissingRuntimeDir,
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    pub fn launch_failed(name: impl Into<String>, source: io::Error) -> Self {
        Self::LaunchFailed {
            name: name.into(),
            source,
        }
    }
}
