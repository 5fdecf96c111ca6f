//! Session supervision: the helper display server, the compositor and the
//! screensaver, each run as a child process with a bounded shutdown.

pub mod environment;
pub mod errors;
pub mod process;
pub mod screensaver;
pub mod supervisor;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use errors::SessionError;
pub use process::{ProcessCommand, ProcessSlot, ProcessState};
pub use screensaver::ScreenSaverProcess;
pub use supervisor::{
    LogoutHandler, PipelineEvent, PipelineHandle, PipelineNotification, SessionExit, Supervisor,
};
pub use watcher::SocketWatch;
