pub mod errors;
pub mod layer;
pub mod popup;
pub mod runtime;
pub mod shell;
pub mod surface;

// Re-export key types
pub use errors::ShellError;
pub use layer::LayerRegistry;
pub use popup::PopupGrabCoordinator;
pub use runtime::{InputQueue, Runtime};
pub use shell::{ShellConfig, ShellEngine, ShellEvent, ShellInput, ShellRequest};
pub use surface::{Surface, SurfaceRole};
