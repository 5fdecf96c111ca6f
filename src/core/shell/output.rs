//! Output geometry used for placing shell surfaces.

use std::collections::BTreeMap;

use crate::core::surface::Rect;

#[derive(Debug, Clone)]
pub struct OutputLayout {
    outputs: BTreeMap<u32, Rect>,
    primary: u32,
    /// Geometry used when no output is known at all.
    fallback: Rect,
}

impl OutputLayout {
    pub fn new(fallback: Rect) -> Self {
        Self {
            outputs: BTreeMap::new(),
            primary: 0,
            fallback,
        }
    }

    /// Add or update an output. The first output added becomes primary.
    pub fn add(&mut self, output: u32, geometry: Rect) {
        if self.outputs.is_empty() {
            self.primary = output;
        }
        self.outputs.insert(output, geometry);
        tracing::debug!("Output {} geometry {:?}", output, geometry);
    }

    /// Remove an output. If it was primary, the lowest remaining id takes over.
    pub fn remove(&mut self, output: u32) {
        if self.outputs.remove(&output).is_none() {
            return;
        }
        if self.primary == output {
            self.primary = self.outputs.keys().next().copied().unwrap_or(0);
        }
    }

    pub fn primary(&self) -> Rect {
        self.outputs
            .get(&self.primary)
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Geometry of `output`, falling back to the primary output when it is
    /// absent or unknown.
    pub fn geometry_for(&self, output: Option<u32>) -> Rect {
        match output {
            Some(id) => match self.outputs.get(&id) {
                Some(geometry) => *geometry,
                None => {
                    tracing::debug!("Unknown output {}, using primary output", id);
                    self.primary()
                }
            },
            None => self.primary(),
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_without_outputs() {
        let layout = OutputLayout::new(Rect::new(0, 0, 1920, 1080));
        assert_eq!(layout.primary(), Rect::new(0, 0, 1920, 1080));
        assert_eq!(layout.geometry_for(Some(4)), Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_unknown_output_uses_primary() {
        let mut layout = OutputLayout::new(Rect::default());
        layout.add(1, Rect::new(0, 0, 1280, 720));
        layout.add(2, Rect::new(1280, 0, 1920, 1080));

        assert_eq!(layout.geometry_for(Some(2)).top_left().x, 1280.0);
        assert_eq!(layout.geometry_for(Some(9)), Rect::new(0, 0, 1280, 720));
        assert_eq!(layout.geometry_for(None), Rect::new(0, 0, 1280, 720));
    }

    #[test]
    fn test_primary_moves_on_removal() {
        let mut layout = OutputLayout::new(Rect::default());
        layout.add(1, Rect::new(0, 0, 1280, 720));
        layout.add(2, Rect::new(1280, 0, 1920, 1080));
        layout.remove(1);
        assert_eq!(layout.primary(), Rect::new(1280, 0, 1920, 1080));
    }
}
