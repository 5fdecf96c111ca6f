//! Surface layer registry.
//!
//! Holds the shell's surface records and one [`Layer`] per layered role.
//! A surface sits in at most one layer, the one matching its role; a surface
//! whose role is `None` sits in no layer. Every mutation below keeps that
//! invariant before returning.

use std::collections::HashMap;

use crate::core::errors::{Result, ShellError};
use crate::core::surface::{Point, Surface, SurfaceRole};

use super::layer::Layer;

/// Hit-testing priority, first match wins.
pub const HIT_TEST_ORDER: [SurfaceRole; 6] = [
    SurfaceRole::Lock,
    SurfaceRole::Dialog,
    SurfaceRole::Overlay,
    SurfaceRole::Panel,
    SurfaceRole::Desktop,
    SurfaceRole::Background,
];

/// Visibility of a set of surfaces captured before hiding them.
#[derive(Debug, Clone, Default)]
pub struct VisibilitySnapshot {
    visible: HashMap<u32, bool>,
}

impl VisibilitySnapshot {
    pub fn was_visible(&self, surface_id: u32) -> Option<bool> {
        self.visible.get(&surface_id).copied()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

#[derive(Debug)]
pub struct LayerRegistry {
    surfaces: HashMap<u32, Surface>,
    layers: Vec<Layer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            layers: SurfaceRole::LAYERED.iter().map(|&role| Layer::new(role)).collect(),
        }
    }

    // =========================================================================
    // Surface Records
    // =========================================================================

    /// Track a new surface. Any role it carries is honored.
    pub fn add_surface(&mut self, surface: Surface) -> u32 {
        let id = surface.id;
        let role = surface.role;
        if let Some(previous) = self.surfaces.insert(id, surface) {
            self.detach(id, previous.role);
        }
        if let Some(layer) = self.layer_mut(role) {
            layer.insert(id);
        }
        tracing::debug!("Registered surface {} ({})", id, role.name());
        id
    }

    /// Forget a surface, removing it from its layer.
    pub fn remove_surface(&mut self, surface_id: u32) -> Option<Surface> {
        let surface = self.surfaces.remove(&surface_id)?;
        self.detach(surface_id, surface.role);
        tracing::debug!("Unregistered surface {}", surface_id);
        Some(surface)
    }

    pub fn get(&self, surface_id: u32) -> Option<&Surface> {
        self.surfaces.get(&surface_id)
    }

    pub fn get_mut(&mut self, surface_id: u32) -> Option<&mut Surface> {
        self.surfaces.get_mut(&surface_id)
    }

    pub fn contains(&self, surface_id: u32) -> bool {
        self.surfaces.contains_key(&surface_id)
    }

    pub fn require(&self, surface_id: u32) -> Result<&Surface> {
        self.surfaces
            .get(&surface_id)
            .ok_or(ShellError::InvalidSurfaceId(surface_id))
    }

    /// Surfaces owned by a client, in ascending id order.
    pub fn surfaces_of_client(&self, client_id: u32) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .surfaces
            .values()
            .filter(|surface| surface.client_id == client_id)
            .map(|surface| surface.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    // =========================================================================
    // Roles and Layers
    // =========================================================================

    /// Give a surface a role, moving it to the top of the matching layer.
    /// Returns the role it held before.
    pub fn assign(&mut self, surface_id: u32, role: SurfaceRole) -> Result<SurfaceRole> {
        let previous = self.require(surface_id)?.role;

        self.detach(surface_id, previous);
        if let Some(layer) = self.layer_mut(role) {
            layer.insert(surface_id);
        }
        if let Some(surface) = self.surfaces.get_mut(&surface_id) {
            surface.role = role;
        }

        tracing::debug!(
            "Surface {} role {} -> {}",
            surface_id,
            previous.name(),
            role.name()
        );
        Ok(previous)
    }

    /// Surfaces of one role, bottom to top.
    pub fn layer(&self, role: SurfaceRole) -> &[u32] {
        role.layer_index()
            .map(|index| self.layers[index].stacking_order.as_slice())
            .unwrap_or(&[])
    }

    /// Which layer currently holds a surface, found by scanning.
    pub fn layer_of(&self, surface_id: u32) -> Option<SurfaceRole> {
        self.layers
            .iter()
            .find(|layer| layer.contains(surface_id))
            .map(|layer| layer.role)
    }

    fn layer_mut(&mut self, role: SurfaceRole) -> Option<&mut Layer> {
        let index = role.layer_index()?;
        self.layers.get_mut(index)
    }

    fn detach(&mut self, surface_id: u32, role: SurfaceRole) {
        if let Some(layer) = self.layer_mut(role) {
            layer.remove(surface_id);
        }
    }

    // =========================================================================
    // Placement and Visibility
    // =========================================================================

    pub fn set_position(&mut self, surface_id: u32, position: Point) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&surface_id)
            .ok_or(ShellError::InvalidSurfaceId(surface_id))?;
        surface.position = position;
        Ok(())
    }

    /// Returns whether the visibility actually changed.
    pub fn set_visible(&mut self, surface_id: u32, visible: bool) -> Result<bool> {
        let surface = self
            .surfaces
            .get_mut(&surface_id)
            .ok_or(ShellError::InvalidSurfaceId(surface_id))?;
        let changed = surface.visible != visible;
        surface.visible = visible;
        Ok(changed)
    }

    /// Show or hide every surface in the given layers in one step.
    /// Returns the surfaces whose visibility changed.
    pub fn set_all_visible(&mut self, roles: &[SurfaceRole], visible: bool) -> Vec<u32> {
        let mut changed = Vec::new();
        for &role in roles {
            let Some(index) = role.layer_index() else {
                continue;
            };
            for &id in &self.layers[index].stacking_order {
                if let Some(surface) = self.surfaces.get_mut(&id) {
                    if surface.visible != visible {
                        surface.visible = visible;
                        changed.push(id);
                    }
                }
            }
        }
        changed
    }

    pub fn snapshot_visibility(&self, roles: &[SurfaceRole]) -> VisibilitySnapshot {
        let mut visible = HashMap::new();
        for &role in roles {
            for &id in self.layer(role) {
                if let Some(surface) = self.surfaces.get(&id) {
                    visible.insert(id, surface.visible);
                }
            }
        }
        VisibilitySnapshot { visible }
    }

    /// Put the given layers back to a captured visibility. Surfaces that joined
    /// a layer after the snapshot was taken become visible.
    /// Returns the surfaces whose visibility changed, with their new value.
    pub fn restore_visibility(
        &mut self,
        snapshot: &VisibilitySnapshot,
        roles: &[SurfaceRole],
    ) -> Vec<(u32, bool)> {
        let mut changed = Vec::new();
        for &role in roles {
            let Some(index) = role.layer_index() else {
                continue;
            };
            for &id in &self.layers[index].stacking_order {
                let target = snapshot.was_visible(id).unwrap_or(true);
                if let Some(surface) = self.surfaces.get_mut(&id) {
                    if surface.visible != target {
                        surface.visible = target;
                        changed.push((id, target));
                    }
                }
            }
        }
        changed
    }

    // =========================================================================
    // Hit Testing
    // =========================================================================

    /// Find the topmost visible surface under a global point.
    ///
    /// Layers are scanned in [`HIT_TEST_ORDER`], each from its topmost surface
    /// down. Returns the surface and the point in its local coordinates.
    pub fn hit_test(&self, point: Point) -> Option<(u32, Point)> {
        for role in HIT_TEST_ORDER {
            for id in self.layers[role.layer_index()?].top_down() {
                let Some(surface) = self.surfaces.get(&id) else {
                    continue;
                };
                if surface.visible && surface.bounds().contains(point) {
                    return Some((id, surface.to_local(point)));
                }
            }
        }
        None
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
