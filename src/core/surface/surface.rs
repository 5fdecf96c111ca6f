use super::geometry::{Point, Rect};
use super::role::SurfaceRole;

/// The shell's view of a surface owned by the display server core.
///
/// The engine never owns the underlying surface. It mirrors the attributes it
/// needs for role, placement and hit-testing, and drops the record when the
/// core reports the surface gone.
#[derive(Debug, Clone)]
pub struct Surface {
    pub id: u32,
    pub client_id: u32,
    pub role: SurfaceRole,
    /// Top-left corner in global coordinates, consumed by rendering.
    pub position: Point,
    pub width: i32,
    pub height: i32,
    /// Whether the shell wants this surface shown.
    pub visible: bool,
    /// Whether the client has attached content yet.
    pub mapped: bool,
}

impl Surface {
    pub fn new(id: u32, client_id: u32, width: i32, height: i32) -> Self {
        Self {
            id,
            client_id,
            role: SurfaceRole::None,
            position: Point::default(),
            width,
            height,
            visible: true,
            mapped: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x.floor() as i32,
            self.position.y.floor() as i32,
            self.width,
            self.height,
        )
    }

    /// Translate a global point into this surface's local space.
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.position.x, point.y - self.position.y)
    }
}
