//! Player movement and collision constraints
//!
//! Pure functions over an [`Arena`]; the client predictor runs exactly the
//! same code against its local arena copy.

use super::arena::Arena;

/// Gap kept between a player's edge and the map edge
pub const BOUNDS_MARGIN: f32 = 2.0;

/// Multiple of a player's speed accepted as one position-style move
pub const MOVE_SLACK: f32 = 2.5;

/// Movement system for sliding players around obstacles
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Resolve a desired move from `(x, y)` to `(nx, ny)`.
    ///
    /// Tries the full move, then x only, then y only, and otherwise stays
    /// put. The result is clamped into the arena interior.
    pub fn resolve_move(arena: &Arena, radius: f32, x: f32, y: f32, nx: f32, ny: f32) -> (f32, f32) {
        let (rx, ry) = if !arena.blocked(nx, ny, radius) {
            (nx, ny)
        } else if !arena.blocked(nx, y, radius) {
            (nx, y)
        } else if !arena.blocked(x, ny, radius) {
            (x, ny)
        } else {
            (x, y)
        };

        Self::clamp_to_bounds(arena, radius, rx, ry)
    }

    /// Keep a circle of `radius` inside the map, inset by [`BOUNDS_MARGIN`]
    pub fn clamp_to_bounds(arena: &Arena, radius: f32, x: f32, y: f32) -> (f32, f32) {
        let inset = radius + BOUNDS_MARGIN;
        let max_x = (arena.width - inset).max(inset);
        let max_y = (arena.height - inset).max(inset);
        (x.clamp(inset, max_x), y.clamp(inset, max_y))
    }

    /// Scale a direction intent by `speed`, clamping its length to `speed`.
    /// Returns the displacement for one tick.
    pub fn velocity_displacement(vx: f32, vy: f32, speed: f32) -> (f32, f32) {
        // hypot keeps very large finite inputs from overflowing to inf
        let len = vx.hypot(vy);
        if len > 1.0 {
            (vx / len * speed, vy / len * speed)
        } else {
            (vx * speed, vy * speed)
        }
    }

    /// Limit the jump from `(x, y)` toward `(tx, ty)` to `max_dist`
    pub fn clamp_displacement(x: f32, y: f32, tx: f32, ty: f32, max_dist: f32) -> (f32, f32) {
        let dx = tx - x;
        let dy = ty - y;
        let dist = dx.hypot(dy);
        if dist > max_dist {
            (x + dx / dist * max_dist, y + dy / dist * max_dist)
        } else {
            (tx, ty)
        }
    }

    /// One tick of velocity-intent movement
    pub fn step_velocity(
        arena: &Arena,
        radius: f32,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        speed: f32,
    ) -> (f32, f32) {
        let (dx, dy) = Self::velocity_displacement(vx, vy, speed);
        if dx == 0.0 && dy == 0.0 {
            return (x, y);
        }
        Self::resolve_move(arena, radius, x, y, x + dx, y + dy)
    }

    /// Apply a position-style move, bounded to `speed * MOVE_SLACK`
    pub fn step_toward_target(
        arena: &Arena,
        radius: f32,
        x: f32,
        y: f32,
        tx: f32,
        ty: f32,
        speed: f32,
    ) -> (f32, f32) {
        let (nx, ny) = Self::clamp_displacement(x, y, tx, ty, speed * MOVE_SLACK);
        if nx == x && ny == y {
            return (x, y);
        }
        Self::resolve_move(arena, radius, x, y, nx, ny)
    }
}
