//! Core error types

use thiserror::Error;

/// Errors raised by shell protocol handlers.
///
/// Every variant describes a single refused request. The session carries on
/// unaffected, so none of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Invalid surface ID: {0}")]
    InvalidSurfaceId(u32),

    #[error("Unknown client: {0}")]
    UnknownClient(u32),

    #[error("Popup grab conflict: chain {chain} is held by popup {active}, refused popup {requested}")]
    GrabConflict {
        chain: u32,
        active: u32,
        requested: u32,
    },

    #[error("Popup {0} refused: session is locked")]
    SessionLocked(u32),
}

impl ShellError {
    /// True for misuse that a well-behaved client can trigger by racing a
    /// surface destruction against a request.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, ShellError::InvalidSurfaceId(_))
    }
}

/// Result type for shell operations
pub type Result<T> = std::result::Result<T, ShellError>;
