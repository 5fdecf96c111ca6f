pub mod surface;
pub mod role;
pub mod geometry;

pub use surface::Surface;
pub use role::SurfaceRole;
pub use geometry::{Point, Rect};
