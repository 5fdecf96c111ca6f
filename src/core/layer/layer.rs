//! Per-role stacking order.

use crate::core::surface::SurfaceRole;

/// Surfaces sharing one role, in stacking order (back to front).
/// The last element is the topmost surface.
#[derive(Debug)]
pub struct Layer {
    pub role: SurfaceRole,
    pub stacking_order: Vec<u32>,
}

impl Layer {
    pub fn new(role: SurfaceRole) -> Self {
        Self {
            role,
            stacking_order: Vec::new(),
        }
    }

    /// Insert a surface at the top of the layer.
    pub fn insert(&mut self, surface_id: u32) {
        if !self.stacking_order.contains(&surface_id) {
            self.stacking_order.push(surface_id);
        }
    }

    /// Remove a surface, leaving the others in place.
    pub fn remove(&mut self, surface_id: u32) -> bool {
        if let Some(pos) = self.stacking_order.iter().position(|&id| id == surface_id) {
            self.stacking_order.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, surface_id: u32) -> bool {
        self.stacking_order.contains(&surface_id)
    }

    pub fn topmost(&self) -> Option<u32> {
        self.stacking_order.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stacking_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacking_order.is_empty()
    }

    /// Iterate from the topmost surface down.
    pub fn top_down(&self) -> impl Iterator<Item = u32> + '_ {
        self.stacking_order.iter().rev().copied()
    }
}
