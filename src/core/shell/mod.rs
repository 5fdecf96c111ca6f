//! Shell protocol engine.
//!
//! `ShellEngine` is the single owner of shell state: the layer registry, the
//! popup grabs, bound clients with their key bindings, and the session lock
//! state machine. It is driven by [`ShellInput`] values on one control thread
//! and reports what happened as [`ShellEvent`]s collected for the caller.
//!
//! Handlers validate their arguments before touching state, so a refused
//! request leaves no partial mutation behind.

pub mod client;
pub mod event;
pub mod lock;
pub mod output;
pub mod request;
pub mod roles;
pub mod screensaver;


use std::collections::BTreeMap;

use crate::core::errors::{Result, ShellError};
use crate::core::layer::{LayerRegistry, VisibilitySnapshot};
use crate::core::popup::PopupGrabCoordinator;
use crate::core::surface::{Rect, SurfaceRole};

pub use client::{ClientBinding, KeyBinding};
pub use event::ShellEvent;
pub use lock::LockState;
pub use output::OutputLayout;
pub use request::{ShellInput, ShellRequest};
pub use screensaver::{NoScreenSaver, ScreenSaverControl};

/// Configuration for the shell engine
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Geometry assumed for the primary output until the core reports one.
    pub primary_output: Rect,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            primary_output: Rect::new(0, 0, 1920, 1080),
        }
    }
}

pub struct ShellEngine {
    registry: LayerRegistry,
    grabs: PopupGrabCoordinator,
    outputs: OutputLayout,

    /// Bound clients, ordered by id so broadcasts are deterministic.
    clients: BTreeMap<u32, ClientBinding>,
    /// Registration counter, orders key bindings across clients.
    key_binding_serial: u64,

    lock_state: LockState,
    /// Weak: cleared when the surface is destroyed.
    lock_surface: Option<u32>,
    /// Clients that were asked to prepare a lock surface this cycle.
    prepare_sent_to: Vec<u32>,
    /// Visibility of the lockable layers right before the lock.
    saved_visibility: Option<VisibilitySnapshot>,
    screensaver: Box<dyn ScreenSaverControl>,

    focus: Option<u32>,
    events: Vec<ShellEvent>,
}

impl ShellEngine {
    pub fn new(config: ShellConfig, screensaver: Box<dyn ScreenSaverControl>) -> Self {
        Self {
            registry: LayerRegistry::new(),
            grabs: PopupGrabCoordinator::new(),
            outputs: OutputLayout::new(config.primary_output),
            clients: BTreeMap::new(),
            key_binding_serial: 0,
            lock_state: LockState::Unlocked,
            lock_surface: None,
            prepare_sent_to: Vec::new(),
            saved_visibility: None,
            screensaver,
            focus: None,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Feed one input to the engine.
    ///
    /// Refused requests are logged and dropped here; nothing propagates back
    /// across the protocol boundary.
    pub fn handle(&mut self, input: ShellInput) {
        let result = match input {
            ShellInput::ClientBound { client } => {
                self.bind_client(client);
                Ok(())
            }
            ShellInput::ClientDisconnected { client } => {
                self.disconnect_client(client);
                Ok(())
            }
            ShellInput::Request { client, request } => {
                let name = request.name();
                if let Err(e) = self.dispatch(client, request) {
                    tracing::warn!("Refused {} from client {}: {}", name, client, e);
                }
                Ok(())
            }
            ShellInput::SurfaceCreated { surface, client, width, height } => {
                self.surface_created(surface, client, width, height);
                Ok(())
            }
            ShellInput::SurfaceResized { surface, width, height } => {
                self.surface_resized(surface, width, height)
            }
            ShellInput::SurfaceMapped { surface } => self.surface_mapped(surface),
            ShellInput::SurfaceDestroyed { surface } => {
                self.surface_destroyed(surface);
                Ok(())
            }
            ShellInput::OutputAdded { output, geometry } => {
                self.outputs.add(output, geometry);
                Ok(())
            }
            ShellInput::OutputRemoved { output } => {
                self.outputs.remove(output);
                Ok(())
            }
            ShellInput::LockRequested => {
                self.request_lock();
                Ok(())
            }
            ShellInput::UnlockRequested => {
                self.request_unlock();
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::debug!("Core notification ignored: {}", e);
        }
    }

    /// Handle one client request.
    pub fn dispatch(&mut self, client: u32, request: ShellRequest) -> Result<()> {
        if !self.clients.contains_key(&client) {
            return Err(ShellError::UnknownClient(client));
        }

        match request {
            ShellRequest::SetBackground { surface, output } => {
                self.assign_role(surface, SurfaceRole::Background, output)
            }
            ShellRequest::SetDesktop { surface, output } => {
                self.assign_role(surface, SurfaceRole::Desktop, output)
            }
            ShellRequest::SetPanel { surface, output } => {
                self.assign_role(surface, SurfaceRole::Panel, output)
            }
            ShellRequest::SetOverlay { surface, output } => {
                self.assign_role(surface, SurfaceRole::Overlay, output)
            }
            ShellRequest::SetDialog { surface, output } => {
                self.assign_role(surface, SurfaceRole::Dialog, output)
            }
            ShellRequest::SetPosition { surface, x, y } => self.set_position(surface, x, y),
            ShellRequest::SetPopup { popup, parent, x, y } => self.show_popup(popup, parent, x, y),
            ShellRequest::DismissPopup { popup } => {
                self.dismiss_popup(popup);
                Ok(())
            }
            ShellRequest::AddKeyBinding { id, key, modifiers } => {
                self.add_key_binding(client, id, key, modifiers)
            }
            ShellRequest::RemoveKeyBinding { id } => self.remove_key_binding(client, id),
            ShellRequest::SetLockSurface { surface } => self.client_set_lock_surface(surface),
            ShellRequest::ClearLockSurface { surface } => self.client_clear_lock_surface(surface),
            ShellRequest::Lock => {
                self.client_lock();
                Ok(())
            }
            ShellRequest::Unlock => {
                self.client_unlock();
                Ok(())
            }
            ShellRequest::DesktopReady => {
                tracing::info!("Desktop ready (client {})", client);
                self.emit(ShellEvent::Ready);
                Ok(())
            }
            ShellRequest::AddWorkspace => {
                self.emit(ShellEvent::WorkspaceAdded);
                Ok(())
            }
            ShellRequest::SelectWorkspace { id } => {
                tracing::debug!("select_workspace {} accepted, no policy attached", id);
                Ok(())
            }
            ShellRequest::SetGrabSurface { surface } => {
                tracing::debug!("set_grab_surface {} accepted, no effect", surface);
                Ok(())
            }
            ShellRequest::Quit
            | ShellRequest::MinimizeWindows
            | ShellRequest::RestoreWindows => Ok(()),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub(crate) fn emit(&mut self, event: ShellEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ShellEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn grabs(&self) -> &PopupGrabCoordinator {
        &self.grabs
    }

    pub fn outputs(&self) -> &OutputLayout {
        &self.outputs
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state.is_locked()
    }

    pub fn lock_surface(&self) -> Option<u32> {
        self.lock_surface
    }

    /// Whether a prepare-lock-surface round trip is outstanding.
    pub fn prepare_pending(&self) -> bool {
        !self.prepare_sent_to.is_empty()
    }

    pub fn focus(&self) -> Option<u32> {
        self.focus
    }

    pub fn client(&self, client: u32) -> Option<&ClientBinding> {
        self.clients.get(&client)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub(crate) fn set_focus(&mut self, surface: Option<u32>) {
        if self.focus != surface {
            self.focus = surface;
            self.emit(ShellEvent::FocusChanged { surface });
        }
    }
}

impl Default for ShellEngine {
    fn default() -> Self {
        Self::new(ShellConfig::default(), Box::new(NoScreenSaver))
    }
}
