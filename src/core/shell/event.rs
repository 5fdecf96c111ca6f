use crate::core::surface::{Point, SurfaceRole};

/// Notifications emitted by the shell engine.
///
/// Variants carrying a `client` are addressed to that client only; the rest
/// go to the rendering and session collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// Sent to a client right after it binds the shell global.
    Loaded { client: u32 },
    /// Asks a client to create its lock surface.
    PrepareLockSurface { client: u32 },
    LockedChanged(bool),
    /// A lock was requested while already locked: turn the display off.
    DisplaySleep,
    /// The desktop client finished loading.
    Ready,
    WorkspaceAdded,
    /// The UI should dismiss any splash and fade the desktop in.
    FadeIn,
    RoleAssigned { surface: u32, role: SurfaceRole, position: Point },
    PositionChanged { surface: u32, position: Point },
    VisibilityChanged { surface: u32, visible: bool },
    FocusChanged { surface: Option<u32> },
    PopupShown { popup: u32, parent: u32, position: Point },
    PopupDismissed { popup: u32 },
}
