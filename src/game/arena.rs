//! Arena geometry: map bounds, wall rectangles and spawn points
//!
//! An [`Arena`] is built once and never mutated; the server shares it
//! behind an `Arc` and clients rebuild their copy from `map_data`.

use super::geometry::{circle_intersects_any, Rect};

pub const MAP_WIDTH: f32 = 1200.0;
pub const MAP_HEIGHT: f32 = 800.0;

/// Spawn location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<Rect>,
    pub spawn_points: Vec<SpawnPoint>,
}

impl Arena {
    pub fn new(width: f32, height: f32, obstacles: Vec<Rect>, spawn_points: Vec<SpawnPoint>) -> Self {
        Self {
            width,
            height,
            obstacles,
            spawn_points,
        }
    }

    /// Client-side copy built from a `map_data` message (no spawn points)
    pub fn from_map(width: f32, height: f32, obstacles: Vec<Rect>) -> Self {
        Self::new(width, height, obstacles, Vec::new())
    }

    /// True if a circle at this position overlaps any wall
    pub fn blocked(&self, x: f32, y: f32, radius: f32) -> bool {
        circle_intersects_any(x, y, radius, &self.obstacles)
    }

    /// True if the point lies outside `[0, width] x [0, height]`
    pub fn out_of_bounds(&self, x: f32, y: f32) -> bool {
        x < 0.0 || x > self.width || y < 0.0 || y > self.height
    }

    /// The built-in deathmatch map
    pub fn standard() -> Self {
        let w = MAP_WIDTH;
        let h = MAP_HEIGHT;
        let obstacles = vec![
            // Boundary
            Rect::new(0.0, 0.0, w, 20.0),
            Rect::new(0.0, h - 20.0, w, 20.0),
            Rect::new(0.0, 0.0, 20.0, h),
            Rect::new(w - 20.0, 0.0, 20.0, h),
            // Central cross
            Rect::new(540.0, 340.0, 120.0, 20.0),
            Rect::new(590.0, 290.0, 20.0, 120.0),
            // Corner clusters
            Rect::new(100.0, 100.0, 120.0, 20.0),
            Rect::new(100.0, 100.0, 20.0, 100.0),
            Rect::new(180.0, 100.0, 20.0, 60.0),
            Rect::new(980.0, 100.0, 120.0, 20.0),
            Rect::new(1080.0, 100.0, 20.0, 100.0),
            Rect::new(1000.0, 100.0, 20.0, 60.0),
            Rect::new(100.0, 680.0, 120.0, 20.0),
            Rect::new(100.0, 600.0, 20.0, 100.0),
            Rect::new(180.0, 640.0, 20.0, 60.0),
            Rect::new(980.0, 680.0, 120.0, 20.0),
            Rect::new(1080.0, 600.0, 20.0, 100.0),
            Rect::new(1000.0, 640.0, 20.0, 60.0),
            // Side barriers
            Rect::new(80.0, 340.0, 160.0, 20.0),
            Rect::new(80.0, 440.0, 160.0, 20.0),
            Rect::new(960.0, 340.0, 160.0, 20.0),
            Rect::new(960.0, 440.0, 160.0, 20.0),
            // Top and bottom columns
            Rect::new(380.0, 120.0, 20.0, 120.0),
            Rect::new(800.0, 120.0, 20.0, 120.0),
            Rect::new(380.0, 560.0, 20.0, 120.0),
            Rect::new(800.0, 560.0, 20.0, 120.0),
            // Pillars
            Rect::new(280.0, 220.0, 30.0, 30.0),
            Rect::new(890.0, 220.0, 30.0, 30.0),
            Rect::new(280.0, 550.0, 30.0, 30.0),
            Rect::new(890.0, 550.0, 30.0, 30.0),
            // Center cover
            Rect::new(450.0, 200.0, 20.0, 80.0),
            Rect::new(730.0, 200.0, 20.0, 80.0),
            Rect::new(450.0, 520.0, 20.0, 80.0),
            Rect::new(730.0, 520.0, 20.0, 80.0),
        ];

        let spawn_points = [
            (150.0, 200.0),
            (1050.0, 200.0),
            (150.0, 600.0),
            (1050.0, 600.0),
            (600.0, 100.0),
            (600.0, 700.0),
            (300.0, 400.0),
            (900.0, 400.0),
        ]
        .into_iter()
        .map(|(x, y)| SpawnPoint { x, y })
        .collect();

        Self::new(w, h, obstacles, spawn_points)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::standard()
    }
}
