pub mod layer;
pub mod registry;

pub use layer::Layer;
pub use registry::{LayerRegistry, VisibilitySnapshot, HIT_TEST_ORDER};
