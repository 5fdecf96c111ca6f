//! Session process pipeline.
//!
//! Nested sessions run a helper display server first and start the
//! compositor on top of it once the helper's socket shows up in the runtime
//! directory. Otherwise the compositor is launched straight against the host
//! display server.
//!
//! Either child exiting takes the other one down and ends the session. There
//! are no restarts: one attempt per process per session.
//!
//! Everything is serialized on the thread calling [`Supervisor::run`]:
//! socket-watch callbacks, operator requests from [`PipelineHandle`] and
//! child-exit polling all meet in one channel.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};

use crate::config::SessionConfig;

use super::environment::{self, SocketNames};
use super::errors::{Result, SessionError};
use super::process::{ProcessCommand, ProcessSlot};
use super::watcher::SocketWatch;

/// Inputs to the supervisor's control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The helper's socket exists.
    SocketReady,
    /// Operator stop.
    Stop,
    /// Log out, then stop.
    LogOut,
}

/// Milestones recorded for the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineNotification {
    HelperStarted { pid: u32 },
    CompositorStarted { pid: u32 },
    Stopped,
}

/// Why the session ended. Exit codes are `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    CompositorExited(Option<i32>),
    HelperExited(Option<i32>),
    Stopped,
}

/// Session manager hook run before teardown on log out.
pub trait LogoutHandler: Send {
    fn log_out(&mut self);
}

impl<F: FnMut() + Send> LogoutHandler for F {
    fn log_out(&mut self) {
        self()
    }
}

/// Cloneable remote control for a running [`Supervisor`].
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: Sender<PipelineEvent>,
}

impl PipelineHandle {
    /// Ask the pipeline to stop. Returns `false` once the supervisor is gone.
    pub fn stop(&self) -> bool {
        self.tx.send(PipelineEvent::Stop).is_ok()
    }

    /// Ask the pipeline to log out and stop.
    pub fn log_out(&self) -> bool {
        self.tx.send(PipelineEvent::LogOut).is_ok()
    }
}

pub struct Supervisor {
    config: SessionConfig,
    /// Variables every child receives.
    child_env: Vec<(String, String)>,
    /// Host `DISPLAY`, consulted for the compositor environment.
    host_display: Option<String>,

    sockets: Option<SocketNames>,
    socket_watch: Option<SocketWatch>,
    helper: Option<ProcessSlot>,
    compositor: Option<ProcessSlot>,

    tx: Sender<PipelineEvent>,
    rx: Receiver<PipelineEvent>,
    logout: Option<Box<dyn LogoutHandler>>,
    notifications: Vec<PipelineNotification>,
}

impl Supervisor {
    /// Supervisor whose children inherit the host environment plus the
    /// session variables.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_lookup(config, environment::host_lookup)
    }

    /// Like [`Supervisor::new`], evaluating the environment rules against
    /// `lookup` instead of the process environment.
    pub fn with_lookup<F>(config: SessionConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut child_env = environment::session_environment(&lookup);
        child_env.push((
            "XDG_RUNTIME_DIR".to_string(),
            config.runtime_dir.display().to_string(),
        ));
        let (tx, rx) = mpsc::channel();

        Self {
            config,
            child_env,
            host_display: lookup("DISPLAY"),
            sockets: None,
            socket_watch: None,
            helper: None,
            compositor: None,
            tx,
            rx,
            logout: None,
            notifications: Vec::new(),
        }
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn set_logout_handler(&mut self, handler: Box<dyn LogoutHandler>) {
        self.logout = Some(handler);
    }

    /// Take all notifications recorded since the last call.
    pub fn take_notifications(&mut self) -> Vec<PipelineNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn sockets(&self) -> Option<&SocketNames> {
        self.sockets.as_ref()
    }

    pub fn helper(&self) -> Option<&ProcessSlot> {
        self.helper.as_ref()
    }

    pub fn compositor(&self) -> Option<&ProcessSlot> {
        self.compositor.as_ref()
    }

    // =========================================================================
    // Control Loop
    // =========================================================================

    /// Bring the pipeline up and supervise it until the session ends.
    ///
    /// Launch failures are returned as errors after tearing down whatever
    /// was already running.
    pub fn run(&mut self) -> Result<SessionExit> {
        if let Err(e) = self.start() {
            self.shutdown();
            return Err(e);
        }

        loop {
            match self.step() {
                Ok(Some(exit)) => {
                    tracing::info!("Session ended: {:?}", exit);
                    return Ok(exit);
                }
                Ok(None) => {}
                Err(e) => {
                    self.shutdown();
                    return Err(e);
                }
            }
        }
    }

    /// Launch the first process of the pipeline.
    pub fn start(&mut self) -> Result<()> {
        if !self.config.runtime_dir.is_dir() {
            return Err(SessionError::RuntimeDirMissing(self.config.runtime_dir.clone()));
        }

        if self.config.nested {
            self.start_helper()
        } else {
            self.launch_compositor()
        }
    }

    /// Wait one poll interval for an event, then reap exited children.
    pub fn step(&mut self) -> Result<Option<SessionExit>> {
        match self.rx.recv_timeout(self.config.poll_interval) {
            Ok(event) => {
                if let Some(exit) = self.on_event(event)? {
                    return Ok(Some(exit));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // We hold a sender ourselves
            Err(RecvTimeoutError::Disconnected) => {}
        }
        Ok(self.reap())
    }

    fn on_event(&mut self, event: PipelineEvent) -> Result<Option<SessionExit>> {
        match event {
            PipelineEvent::SocketReady => {
                // One-shot: dropping the watch ends it, later sightings are stale
                if self.socket_watch.take().is_none() {
                    tracing::debug!("Stale socket notification ignored");
                    return Ok(None);
                }
                self.launch_compositor()?;
                Ok(None)
            }
            PipelineEvent::Stop => Ok(Some(self.stop())),
            PipelineEvent::LogOut => {
                tracing::info!("Logging out");
                if let Some(handler) = self.logout.as_mut() {
                    handler.log_out();
                }
                Ok(Some(self.stop()))
            }
        }
    }

    // =========================================================================
    // Launching
    // =========================================================================

    fn child_command(&self, base: &ProcessCommand) -> ProcessCommand {
        ProcessCommand::new(base.program.clone())
            .args(base.args.iter().cloned())
            .envs(self.child_env.iter().cloned())
            .envs(base.env.iter().cloned())
    }

    fn start_helper(&mut self) -> Result<()> {
        let sockets = SocketNames::generate();
        let command = self
            .child_command(&self.config.helper)
            .args(environment::helper_args(&sockets));

        // Watch first so the socket cannot appear unobserved
        let tx = self.tx.clone();
        let watch = SocketWatch::start(&self.config.runtime_dir, &sockets.master, move || {
            let _ = tx.send(PipelineEvent::SocketReady);
        })?;

        let mut helper =
            ProcessSlot::new("helper", command).with_stop_timeout(self.config.stop_timeout);
        let started = helper.start();
        self.helper = Some(helper);
        let pid = started?;

        self.notifications.push(PipelineNotification::HelperStarted { pid });
        tracing::info!("Waiting for {:?}", watch.path());

        let tx = self.tx.clone();
        watch.check_existing(move || {
            let _ = tx.send(PipelineEvent::SocketReady);
        });
        self.socket_watch = Some(watch);
        self.sockets = Some(sockets);
        Ok(())
    }

    fn launch_compositor(&mut self) -> Result<()> {
        let helper_socket = self.sockets.as_ref().map(|s| s.master.as_str());
        let display = self.host_display.clone();
        let env = environment::compositor_environment(helper_socket, |key| match key {
            "DISPLAY" => display.clone(),
            _ => None,
        });

        let command = self
            .child_command(&self.config.compositor)
            .args(environment::compositor_args(self.sockets.as_ref()))
            .envs(env);

        let mut compositor =
            ProcessSlot::new("compositor", command).with_stop_timeout(self.config.stop_timeout);
        let started = compositor.start();
        self.compositor = Some(compositor);
        let pid = started?;

        self.notifications.push(PipelineNotification::CompositorStarted { pid });
        Ok(())
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Check both children; an exit on either side cascades to the other.
    fn reap(&mut self) -> Option<SessionExit> {
        if let Some(status) = self.compositor.as_mut().and_then(ProcessSlot::try_reap) {
            tracing::info!("Compositor exited, stopping the session");
            self.stop_helper();
            return Some(SessionExit::CompositorExited(status.code()));
        }

        if let Some(status) = self.helper.as_mut().and_then(ProcessSlot::try_reap) {
            tracing::info!("Helper exited, stopping the session");
            self.socket_watch = None;
            if let Some(compositor) = self.compositor.as_mut() {
                compositor.stop();
            }
            return Some(SessionExit::HelperExited(status.code()));
        }

        None
    }

    /// Operator stop: compositor first, then the helper under it.
    pub fn stop(&mut self) -> SessionExit {
        tracing::info!("Stopping the session");
        self.socket_watch = None;
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.stop();
        }
        self.notifications.push(PipelineNotification::Stopped);
        self.stop_helper();
        SessionExit::Stopped
    }

    fn stop_helper(&mut self) {
        if let Some(helper) = self.helper.as_mut() {
            helper.stop();
        }
    }

    fn shutdown(&mut self) {
        self.socket_watch = None;
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.stop();
        }
        self.stop_helper();
    }
}
