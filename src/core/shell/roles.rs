//! Role assignment, popups and surface lifecycle for the shell engine.

use crate::core::errors::{Result, ShellError};
use crate::core::popup::PopupGrabber;
use crate::core::surface::{Point, Surface, SurfaceRole};

use super::{ShellEngine, ShellEvent};

impl ShellEngine {
    // =========================================================================
    // Roles
    // =========================================================================

    /// Give a surface a shell role, placed at the origin of `output` (or of
    /// the primary output when that one is unknown).
    pub(crate) fn assign_role(
        &mut self,
        surface: u32,
        role: SurfaceRole,
        output: Option<u32>,
    ) -> Result<()> {
        self.registry.require(surface)?;
        let position = self.outputs.geometry_for(output).top_left();

        if self.grabs.is_grabbing(surface) {
            self.dismiss_popup(surface);
        }
        if self.lock_surface == Some(surface) && role != SurfaceRole::Lock {
            self.lock_surface = None;
        }

        self.registry.assign(surface, role)?;
        self.registry.set_position(surface, position)?;

        // Joining a hidden layer mid-lock: stay hidden until resume
        if self.lock_state.is_locked() && SurfaceRole::LOCKABLE.contains(&role) {
            if let Ok(true) = self.registry.set_visible(surface, false) {
                self.emit(ShellEvent::VisibilityChanged { surface, visible: false });
            }
        }

        self.emit(ShellEvent::RoleAssigned { surface, role, position });
        Ok(())
    }

    pub(crate) fn set_position(&mut self, surface: u32, x: i32, y: i32) -> Result<()> {
        let position = Point::new(x as f64, y as f64);
        self.registry.set_position(surface, position)?;
        self.emit(ShellEvent::PositionChanged { surface, position });
        Ok(())
    }

    // =========================================================================
    // Popups
    // =========================================================================

    /// Show `popup` at (`x`, `y`) relative to `parent`, grabbing input for it.
    pub(crate) fn show_popup(&mut self, popup: u32, parent: u32, x: i32, y: i32) -> Result<()> {
        self.registry.require(popup)?;
        let origin = self.registry.require(parent)?.position;

        // Only the lock surface may open popups while locked
        if self.lock_state.is_locked()
            && self.lock_surface != Some(self.grabs.chain_root(parent))
        {
            return Err(ShellError::SessionLocked(popup));
        }

        self.grabs.attach(popup, parent)?;

        let position = origin.offset(x as f64, y as f64);
        self.registry.set_position(popup, position)?;
        self.registry.set_visible(popup, true)?;
        self.emit(ShellEvent::PopupShown { popup, parent, position });
        self.set_focus(Some(popup));
        Ok(())
    }

    /// Close every open popup.
    pub(crate) fn dismiss_all_popups(&mut self) {
        for popup in self.grabs.popups() {
            self.dismiss_popup(popup);
        }
    }

    /// Close a popup. Dismissing twice is harmless.
    pub(crate) fn dismiss_popup(&mut self, popup: u32) {
        let Some(grabber) = self.grabs.dismiss(popup) else {
            return;
        };
        if let Some(surface) = self.registry.get_mut(popup) {
            surface.visible = false;
        }
        self.popup_released(grabber);
    }

    fn popup_released(&mut self, grabber: PopupGrabber) {
        self.emit(ShellEvent::PopupDismissed { popup: grabber.popup });
        if self.focus == Some(grabber.popup) {
            let parent = self
                .registry
                .contains(grabber.parent)
                .then_some(grabber.parent);
            self.set_focus(parent);
        }
    }

    // =========================================================================
    // Surface Lifecycle
    // =========================================================================

    pub(crate) fn surface_created(&mut self, surface: u32, client: u32, width: i32, height: i32) {
        self.registry.add_surface(Surface::new(surface, client, width, height));
    }

    pub(crate) fn surface_resized(&mut self, surface: u32, width: i32, height: i32) -> Result<()> {
        self.registry.require(surface)?;
        if let Some(record) = self.registry.get_mut(surface) {
            record.width = width;
            record.height = height;
        }
        Ok(())
    }

    pub(crate) fn surface_mapped(&mut self, surface: u32) -> Result<()> {
        self.registry.require(surface)?;
        if let Some(record) = self.registry.get_mut(surface) {
            record.mapped = true;
        }
        if self.lock_surface == Some(surface) {
            self.lock_surface_mapped(surface);
        }
        Ok(())
    }

    /// Drop every reference to a surface the core destroyed.
    pub(crate) fn surface_destroyed(&mut self, surface: u32) {
        if self.lock_surface == Some(surface) {
            tracing::debug!("Lock surface {} destroyed", surface);
            self.lock_surface = None;
        }

        let removed = self.registry.remove_surface(surface);

        if let Some(grabber) = self.grabs.surface_destroyed(surface) {
            if let Some(popup) = self.registry.get_mut(grabber.popup) {
                popup.visible = false;
            }
            self.popup_released(grabber);
        }

        if removed.is_some() && self.focus == Some(surface) {
            self.set_focus(None);
        }
    }

    /// Topmost visible shell surface under a global point.
    pub fn surface_at(&self, point: Point) -> Option<(u32, Point)> {
        self.registry.hit_test(point)
    }
}
