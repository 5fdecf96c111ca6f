//! Scoped lifecycle for one supervised child process.
//!
//! A [`ProcessSlot`] owns at most one child at a time:
//!
//! ```text
//! Stopped -> Starting -> Running -> Stopping -> Stopped
//!               |
//!               +-> Failed
//! ```
//!
//! Stopping sends `SIGTERM`, waits up to the slot's stop timeout and then
//! kills. Dropping a slot with a live child runs the same sequence, so a
//! child never outlives its slot.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::errors::{Result, SessionError};

/// Default bound on a graceful stop before escalating to a kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between exit checks during a graceful stop.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Command
// ============================================================================

/// Program, arguments and extra environment for a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable, replacing an earlier value for `key`.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
        self
    }

    pub fn envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        vars.into_iter().fold(self, |cmd, (k, v)| cmd.env(k, v))
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        command.stdin(Stdio::null());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
        command
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// ============================================================================
// Slot
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

#[derive(Debug)]
pub struct ProcessSlot {
    name: String,
    command: ProcessCommand,
    stop_timeout: Duration,
    state: ProcessState,
    child: Option<Child>,
    last_exit: Option<ExitStatus>,
}

impl ProcessSlot {
    pub fn new(name: impl Into<String>, command: ProcessCommand) -> Self {
        Self {
            name: name.into(),
            command,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            state: ProcessState::Stopped,
            child: None,
            last_exit: None,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &ProcessCommand {
        &self.command
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Exit status of the most recent child, once reaped.
    pub fn last_exit(&self) -> Option<ExitStatus> {
        self.last_exit
    }

    /// Spawn the child. Returns once the OS reports it started.
    pub fn start(&mut self) -> Result<u32> {
        if let Some(pid) = self.pid() {
            tracing::warn!("{} already running (pid {})", self.name, pid);
            return Ok(pid);
        }

        self.state = ProcessState::Starting;
        tracing::info!("Starting {}: {}", self.name, self.command);

        match self.command.to_command().spawn() {
            Ok(child) => {
                let pid = child.id();
                self.child = Some(child);
                self.last_exit = None;
                self.state = ProcessState::Running;
                tracing::info!("{} started (pid {})", self.name, pid);
                Ok(pid)
            }
            Err(e) => {
                self.state = ProcessState::Failed;
                tracing::error!("Failed to start {}: {}", self.name, e);
                Err(SessionError::launch_failed(&self.name, e))
            }
        }
    }

    /// Collect the child if it exited on its own (non-blocking).
    pub fn try_reap(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.finish(status);
                Some(status)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to poll {}: {}", self.name, e);
                None
            }
        }
    }

    /// Terminate gracefully, escalating to a kill after the stop timeout.
    ///
    /// Returns the exit status, or `None` when nothing was running.
    pub fn stop(&mut self) -> Option<ExitStatus> {
        let mut child = self.child.take()?;
        self.state = ProcessState::Stopping;
        let pid = child.id();
        tracing::info!("Stopping {} (pid {})", self.name, pid);

        // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc != 0 {
            tracing::debug!(
                "SIGTERM to {} failed: {}",
                self.name,
                std::io::Error::last_os_error()
            );
        }

        let deadline = Instant::now() + self.stop_timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if Instant::now() < deadline => thread::sleep(STOP_POLL_INTERVAL),
                Ok(None) => {
                    tracing::warn!(
                        "{} did not exit within {:?}, killing",
                        self.name,
                        self.stop_timeout
                    );
                    break Self::kill(&self.name, &mut child);
                }
                Err(e) => {
                    tracing::warn!("Failed to poll {}: {}", self.name, e);
                    break Self::kill(&self.name, &mut child);
                }
            }
        };

        match status {
            Some(status) => self.finish(status),
            None => self.state = ProcessState::Stopped,
        }
        status
    }

    fn kill(name: &str, child: &mut Child) -> Option<ExitStatus> {
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to kill {}: {}", name, e);
        }
        match child.wait() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::error!("Failed to reap {}: {}", name, e);
                None
            }
        }
    }

    fn finish(&mut self, status: ExitStatus) {
        self.child = None;
        self.last_exit = Some(status);
        self.state = ProcessState::Stopped;
        log_exit(&self.name, status);
    }
}

impl Drop for ProcessSlot {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.stop();
        }
    }
}

fn log_exit(name: &str, status: ExitStatus) {
    match (status.code(), status.signal()) {
        (Some(0), _) => tracing::info!("{} exited normally", name),
        (Some(code), _) => tracing::warn!("{} exited with code {}", name, code),
        (None, Some(signal)) => tracing::info!("{} terminated by signal {}", name, signal),
        (None, None) => tracing::warn!("{} exited with unknown status", name),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessCommand {
        ProcessCommand::new("/bin/sh").arg("-c").arg(script)
    }

    fn wait_for_exit(slot: &mut ProcessSlot) -> ExitStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(status) = slot.try_reap() {
                return status;
            }
            assert!(Instant::now() < deadline, "child did not exit");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_command_builder() {
        let cmd = ProcessCommand::new("weston")
            .arg("--shell=fullscreen-shell.so")
            .env("A", "1")
            .env("A", "2");
        assert_eq!(cmd.to_string(), "weston --shell=fullscreen-shell.so");
        assert_eq!(cmd.env_var("A"), Some("2"));
        assert_eq!(cmd.env.len(), 1);
    }

    #[test]
    fn test_start_and_reap() {
        let mut slot = ProcessSlot::new("child", sh("exit 3"));
        assert_eq!(slot.state(), ProcessState::Stopped);

        slot.start().unwrap();
        let status = wait_for_exit(&mut slot);
        assert_eq!(status.code(), Some(3));
        assert_eq!(slot.state(), ProcessState::Stopped);
        assert!(!slot.is_running());
        assert_eq!(slot.try_reap(), None);
    }

    #[test]
    fn test_launch_failure_marks_failed() {
        let mut slot = ProcessSlot::new("ghost", ProcessCommand::new("/nonexistent/hawaii-test"));
        let err = slot.start().unwrap_err();
        assert!(matches!(err, SessionError::LaunchFailed { ref name, .. } if name == "ghost"));
        assert_eq!(slot.state(), ProcessState::Failed);
        assert_eq!(slot.stop(), None);
    }

    #[test]
    fn test_graceful_stop() {
        let mut slot = ProcessSlot::new("sleeper", sh("exec sleep 30"));
        slot.start().unwrap();

        let status = slot.stop().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGTERM));
        assert_eq!(slot.state(), ProcessState::Stopped);
        assert!(slot.pid().is_none());
    }

    #[test]
    fn test_stop_escalates_to_kill() {
        let mut slot = ProcessSlot::new("stubborn", sh("trap '' TERM; while :; do sleep 1; done"))
            .with_stop_timeout(Duration::from_millis(200));
        slot.start().unwrap();
        // Give the shell time to install its trap
        thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        let status = slot.stop().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGKILL));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_drop_stops_child() {
        let mut slot = ProcessSlot::new("sleeper", sh("exec sleep 30"));
        let pid = slot.start().unwrap() as libc::pid_t;
        drop(slot);

        // The child was reaped: the pid no longer names our process
        let alive = unsafe { libc::kill(pid, 0) } == 0;
        assert!(!alive);
    }

    #[test]
    fn test_restart_after_exit() {
        let mut slot = ProcessSlot::new("child", sh("exit 0"));
        slot.start().unwrap();
        wait_for_exit(&mut slot);
        slot.start().unwrap();
        assert_eq!(wait_for_exit(&mut slot).code(), Some(0));
    }
}
