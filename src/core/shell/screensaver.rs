//! Screensaver seam.
//!
//! The engine starts the screensaver when the session locks and stops it on
//! resume. The actual process lives in `session::ScreenSaverProcess`.

pub trait ScreenSaverControl {
    /// Start the screensaver. Failures are logged, never fatal to the lock.
    fn launch(&mut self);

    /// Stop the screensaver if it runs. Must return within a bounded time.
    fn terminate(&mut self);

    fn is_running(&self) -> bool;
}

/// Used when the host has no screensaver to run.
#[derive(Debug, Default)]
pub struct NoScreenSaver;

impl ScreenSaverControl for NoScreenSaver {
    fn launch(&mut self) {
        tracing::debug!("No screensaver configured");
    }

    fn terminate(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }
}
