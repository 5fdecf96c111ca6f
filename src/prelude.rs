//! Common imports and types used throughout Hawaii.

pub use std::collections::HashMap;

pub use crate::core::errors::ShellError;
pub use crate::core::shell::{ShellEngine, ShellEvent, ShellInput, ShellRequest};
pub use crate::core::surface::{Point, Rect, SurfaceRole};
pub use crate::session::errors::SessionError;

pub type Result<T> = std::result::Result<T, crate::core::errors::ShellError>;
