//! Inputs accepted by the shell engine.
//!
//! Wire decoding is done by the transport; by the time a request reaches
//! the engine it is one of these variants, already resolved to surface,
//! output and client ids.

use crate::core::surface::Rect;

/// Requests a bound shell client can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellRequest {
    SetBackground { surface: u32, output: Option<u32> },
    SetDesktop { surface: u32, output: Option<u32> },
    SetPanel { surface: u32, output: Option<u32> },
    SetOverlay { surface: u32, output: Option<u32> },
    SetDialog { surface: u32, output: Option<u32> },
    SetPosition { surface: u32, x: i32, y: i32 },
    SetPopup { popup: u32, parent: u32, x: i32, y: i32 },
    DismissPopup { popup: u32 },
    AddKeyBinding { id: u32, key: u32, modifiers: u32 },
    RemoveKeyBinding { id: u32 },
    SetLockSurface { surface: u32 },
    ClearLockSurface { surface: u32 },
    Lock,
    Unlock,
    DesktopReady,
    AddWorkspace,
    SelectWorkspace { id: u32 },
    /// Accepted, no effect.
    SetGrabSurface { surface: u32 },
    /// Accepted, no effect.
    Quit,
    /// Accepted, no effect.
    MinimizeWindows,
    /// Accepted, no effect.
    RestoreWindows,
}

impl ShellRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ShellRequest::SetBackground { .. } => "set_background",
            ShellRequest::SetDesktop { .. } => "set_desktop",
            ShellRequest::SetPanel { .. } => "set_panel",
            ShellRequest::SetOverlay { .. } => "set_overlay",
            ShellRequest::SetDialog { .. } => "set_dialog",
            ShellRequest::SetPosition { .. } => "set_position",
            ShellRequest::SetPopup { .. } => "set_popup",
            ShellRequest::DismissPopup { .. } => "dismiss_popup",
            ShellRequest::AddKeyBinding { .. } => "add_key_binding",
            ShellRequest::RemoveKeyBinding { .. } => "remove_key_binding",
            ShellRequest::SetLockSurface { .. } => "set_lock_surface",
            ShellRequest::ClearLockSurface { .. } => "clear_lock_surface",
            ShellRequest::Lock => "lock",
            ShellRequest::Unlock => "unlock",
            ShellRequest::DesktopReady => "desktop_ready",
            ShellRequest::AddWorkspace => "add_workspace",
            ShellRequest::SelectWorkspace { .. } => "select_workspace",
            ShellRequest::SetGrabSurface { .. } => "set_grab_surface",
            ShellRequest::Quit => "quit",
            ShellRequest::MinimizeWindows => "minimize_windows",
            ShellRequest::RestoreWindows => "restore_windows",
        }
    }
}

/// Everything the engine reacts to, serialized onto the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    /// A client bound the shell global.
    ClientBound { client: u32 },
    ClientDisconnected { client: u32 },
    Request { client: u32, request: ShellRequest },

    // Display server core notifications
    SurfaceCreated { surface: u32, client: u32, width: i32, height: i32 },
    SurfaceResized { surface: u32, width: i32, height: i32 },
    /// The surface got content and is now on screen.
    SurfaceMapped { surface: u32 },
    SurfaceDestroyed { surface: u32 },
    OutputAdded { output: u32, geometry: Rect },
    OutputRemoved { output: u32 },

    // Session policy
    /// The idle timer fired or the session asked for a lock.
    LockRequested,
    /// User activity while locked.
    UnlockRequested,
}
