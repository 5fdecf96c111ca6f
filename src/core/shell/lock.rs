//! Session lock state machine.
//!
//! ```text
//! Unlocked --request_lock--> Locked --request_unlock--> AwaitingPrepare
//!    ^                          |                             |
//!    +------- resume (Resuming) +-----------------------------+
//! ```
//!
//! A second lock while locked turns the display off instead. The
//! prepare-lock-surface round trip happens at most once per lock cycle.

use crate::core::errors::Result;
use crate::core::surface::SurfaceRole;

use super::{ShellEngine, ShellEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
    /// Clients were asked for a lock surface.
    AwaitingPrepare,
    /// Tearing the lock down.
    Resuming,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        !matches!(self, LockState::Unlocked)
    }

    /// States in which a lock surface may be registered.
    pub fn accepts_lock_surface(&self) -> bool {
        matches!(self, LockState::Locked | LockState::AwaitingPrepare)
    }
}

impl ShellEngine {
    /// Lock the session, or put the display to sleep if already locked.
    pub fn request_lock(&mut self) {
        if self.lock_state.is_locked() {
            tracing::debug!("Already locked, putting display to sleep");
            self.emit(ShellEvent::DisplaySleep);
            return;
        }

        self.lock_state = LockState::Locked;
        tracing::info!("Session locked");

        self.dismiss_all_popups();

        self.saved_visibility = Some(self.registry.snapshot_visibility(&SurfaceRole::LOCKABLE));
        for surface in self.registry.set_all_visible(&SurfaceRole::LOCKABLE, false) {
            self.emit(ShellEvent::VisibilityChanged { surface, visible: false });
        }

        // Nothing under the lock keeps input
        self.set_focus(None);

        self.screensaver.launch();
        self.emit(ShellEvent::LockedChanged(true));
    }

    /// Start unlocking: ask the shell clients for a lock surface.
    pub fn request_unlock(&mut self) {
        // Nothing to unlock, or the lock surface is already up: the UI only
        // needs to drop its splash.
        if !self.lock_state.is_locked() || self.lock_surface.is_some() {
            self.emit(ShellEvent::FadeIn);
            return;
        }

        // Nobody left to draw a lock surface
        if self.clients.is_empty() {
            tracing::warn!("No shell client to unlock the session, resuming directly");
            self.resume();
            return;
        }

        if !self.prepare_sent_to.is_empty() {
            tracing::debug!("prepare_lock_surface already outstanding");
            return;
        }

        self.lock_state = LockState::AwaitingPrepare;
        let recipients: Vec<u32> = self.clients.keys().copied().collect();
        for &client in &recipients {
            self.emit(ShellEvent::PrepareLockSurface { client });
        }
        tracing::debug!("Sent prepare_lock_surface to {} client(s)", recipients.len());
        self.prepare_sent_to = recipients;
    }

    pub(crate) fn client_lock(&mut self) {
        if self.lock_state.is_locked() || self.lock_surface.is_some() {
            tracing::debug!("Lock requested while locked, ignored");
            return;
        }
        self.request_lock();
    }

    pub(crate) fn client_unlock(&mut self) {
        self.prepare_sent_to.clear();
        if self.lock_state.is_locked() {
            self.resume();
        }
    }

    pub(crate) fn client_set_lock_surface(&mut self, surface: u32) -> Result<()> {
        let mapped = self.registry.require(surface)?.mapped;

        self.prepare_sent_to.clear();

        if !self.lock_state.accepts_lock_surface() {
            tracing::debug!("Stale lock surface {} ignored", surface);
            return Ok(());
        }

        if let Some(previous) = self.lock_surface.replace(surface) {
            if previous != surface {
                self.release_lock_surface(previous);
            }
        }

        let position = self.outputs.primary().top_left();
        self.registry.assign(surface, SurfaceRole::Lock)?;
        self.registry.set_position(surface, position)?;
        self.registry.set_visible(surface, true)?;
        self.emit(ShellEvent::RoleAssigned {
            surface,
            role: SurfaceRole::Lock,
            position,
        });
        tracing::info!("Lock surface set to {}", surface);

        if mapped {
            self.lock_surface_mapped(surface);
        }
        Ok(())
    }

    pub(crate) fn client_clear_lock_surface(&mut self, surface: u32) -> Result<()> {
        self.registry.require(surface)?;
        if self.lock_surface == Some(surface) {
            self.lock_surface = None;
            self.release_lock_surface(surface);
        }
        Ok(())
    }

    /// The lock surface is on screen: give it input and reveal it.
    pub(crate) fn lock_surface_mapped(&mut self, surface: u32) {
        self.set_focus(Some(surface));
        self.emit(ShellEvent::FadeIn);
    }

    /// Take a former lock surface off screen and out of the lock layer.
    fn release_lock_surface(&mut self, surface: u32) {
        if let Ok(true) = self.registry.set_visible(surface, false) {
            self.emit(ShellEvent::VisibilityChanged { surface, visible: false });
        }
        if let Err(e) = self.registry.assign(surface, SurfaceRole::None) {
            tracing::debug!("Lock surface {} already gone: {}", surface, e);
        }
        if self.focus == Some(surface) {
            self.set_focus(None);
        }
    }

    /// Tear the lock down and give the desktop back.
    pub(crate) fn resume(&mut self) {
        self.lock_state = LockState::Resuming;

        self.screensaver.terminate();

        if let Some(snapshot) = self.saved_visibility.take() {
            for (surface, visible) in
                self.registry.restore_visibility(&snapshot, &SurfaceRole::LOCKABLE)
            {
                self.emit(ShellEvent::VisibilityChanged { surface, visible });
            }
        }

        if let Some(surface) = self.lock_surface.take() {
            self.release_lock_surface(surface);
        }
        self.prepare_sent_to.clear();

        self.lock_state = LockState::Unlocked;
        tracing::info!("Session unlocked");
        self.emit(ShellEvent::LockedChanged(false));
    }
}
