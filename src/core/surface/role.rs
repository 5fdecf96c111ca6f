#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    None,
    Background,
    Desktop,
    Panel,
    Overlay,
    Dialog,
    Lock,
}

impl Default for SurfaceRole {
    fn default() -> Self {
        Self::None
    }
}

impl SurfaceRole {
    /// Roles that own a layer, bottom to top.
    pub const LAYERED: [SurfaceRole; 6] = [
        SurfaceRole::Background,
        SurfaceRole::Desktop,
        SurfaceRole::Panel,
        SurfaceRole::Overlay,
        SurfaceRole::Dialog,
        SurfaceRole::Lock,
    ];

    /// Roles hidden while the session is locked.
    pub const LOCKABLE: [SurfaceRole; 5] = [
        SurfaceRole::Background,
        SurfaceRole::Desktop,
        SurfaceRole::Panel,
        SurfaceRole::Overlay,
        SurfaceRole::Dialog,
    ];

    pub fn is_none(&self) -> bool {
        matches!(self, SurfaceRole::None)
    }

    /// Index of the layer holding surfaces with this role.
    pub fn layer_index(&self) -> Option<usize> {
        Self::LAYERED.iter().position(|role| role == self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceRole::None => "none",
            SurfaceRole::Background => "background",
            SurfaceRole::Desktop => "desktop",
            SurfaceRole::Panel => "panel",
            SurfaceRole::Overlay => "overlay",
            SurfaceRole::Dialog => "dialog",
            SurfaceRole::Lock => "lock",
        }
    }
}
