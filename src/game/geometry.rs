//! Circle and axis-aligned rectangle intersection tests
//!
//! Shared by the server-side resolvers and the client predictor. All tests
//! compare squared distances and never take a square root.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Clamp a point onto or into the rectangle.
    ///
    /// Returns the point itself when it is inside, otherwise the closest
    /// point on the rectangle's edge.
    pub fn nearest_point(&self, px: f32, py: f32) -> (f32, f32) {
        let nx = px.clamp(self.x, self.x + self.w);
        let ny = py.clamp(self.y, self.y + self.h);
        (nx, ny)
    }

    /// True if the circle overlaps this rectangle (touching does not count)
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let (nx, ny) = self.nearest_point(cx, cy);
        let dx = cx - nx;
        let dy = cy - ny;
        dx * dx + dy * dy < radius * radius
    }
}

/// True if the circle overlaps any of the obstacles
pub fn circle_intersects_any(cx: f32, cy: f32, radius: f32, obstacles: &[Rect]) -> bool {
    obstacles
        .iter()
        .any(|rect| rect.intersects_circle(cx, cy, radius))
}

/// True if two circles overlap (touching does not count)
pub fn circle_intersects_circle(ax: f32, ay: f32, ar: f32, bx: f32, by: f32, br: f32) -> bool {
    distance_sq(ax, ay, bx, by) < (ar + br) * (ar + br)
}

/// Point on the segment `a`-`b` closest to `(px, py)`
pub fn nearest_point_on_segment(
    ax: f32,
    ay: f32,
    bx: f32,
    by: f32,
    px: f32,
    py: f32,
) -> (f32, f32) {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (ax, ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (ax + dx * t, ay + dy * t)
}

/// Squared euclidean distance between two points
pub fn distance_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    dx * dx + dy * dy
}
