//! Local avatar prediction and reconciliation
//!
//! The local player's avatar moves immediately on input using the same
//! movement rules the server runs, against a local copy of the arena.
//! Each authoritative snapshot then pulls it back in line.

use std::sync::Arc;

use crate::game::archetype::Character;
use crate::game::physics::PhysicsSystem;
use crate::game::player::PLAYER_RADIUS;
use crate::game::Arena;
use crate::ws::protocol::{ClientMsg, PlayerSnapshot};

/// Squared distance above which the local position snaps (40 units)
pub const SNAP_DISTANCE_SQ: f32 = 40.0 * 40.0;
/// Squared distance above which the local position is blended (4 units)
pub const DRIFT_DISTANCE_SQ: f32 = 4.0 * 4.0;
/// Fraction of the gap closed per blended snapshot
pub const BLEND_FACTOR: f32 = 0.1;

/// How a snapshot changed the local position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Within tolerance, prediction kept
    None,
    /// Moved part of the way toward the server
    Blend,
    /// Replaced by the server position
    Snap,
}

/// The local player's predicted state
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAvatar {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,
    pub alive: bool,
    pub kills: u32,
    pub speed: f32,
    pub character: Character,
}

impl From<&PlayerSnapshot> for LocalAvatar {
    fn from(s: &PlayerSnapshot) -> Self {
        Self {
            x: s.x,
            y: s.y,
            angle: s.angle,
            health: s.health,
            max_health: s.max_health,
            ammo: s.ammo,
            max_ammo: s.max_ammo,
            reloading: s.reloading,
            alive: s.alive,
            kills: s.kills,
            speed: s.character.archetype().speed,
            character: s.character,
        }
    }
}

pub struct Predictor {
    arena: Arc<Arena>,
    avatar: Option<LocalAvatar>,
}

impl Predictor {
    pub fn new(arena: Arc<Arena>) -> Self {
        Self {
            arena,
            avatar: None,
        }
    }

    pub fn set_arena(&mut self, arena: Arc<Arena>) {
        self.arena = arena;
    }

    pub fn avatar(&self) -> Option<&LocalAvatar> {
        self.avatar.as_ref()
    }

    /// Override health ahead of the next snapshot (hit confirmation)
    pub fn set_health(&mut self, health: f32) {
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.health = health;
        }
    }

    pub fn clear(&mut self) {
        self.avatar = None;
    }

    /// Advance the avatar one frame and return the intent to send.
    ///
    /// Nothing moves and nothing is sent until the first snapshot has
    /// placed the avatar, or while it is dead.
    pub fn predict(&mut self, vx: f32, vy: f32, angle: f32) -> Option<ClientMsg> {
        let avatar = self.avatar.as_mut().filter(|a| a.alive)?;

        let (x, y) = PhysicsSystem::step_velocity(
            &self.arena,
            PLAYER_RADIUS,
            avatar.x,
            avatar.y,
            vx,
            vy,
            avatar.speed,
        );
        avatar.x = x;
        avatar.y = y;
        avatar.angle = angle;

        Some(ClientMsg::PlayerVelocity { vx, vy, angle })
    }

    /// Merge an authoritative snapshot of the local player.
    ///
    /// Combat stats are always taken from the server. Position snaps on a
    /// large disagreement, blends on a small one, and is otherwise kept.
    pub fn reconcile(&mut self, server: &PlayerSnapshot) -> Correction {
        let Some(avatar) = self.avatar.as_mut() else {
            self.avatar = Some(LocalAvatar::from(server));
            return Correction::Snap;
        };

        avatar.health = server.health;
        avatar.max_health = server.max_health;
        avatar.ammo = server.ammo;
        avatar.max_ammo = server.max_ammo;
        avatar.reloading = server.reloading;
        avatar.alive = server.alive;
        avatar.kills = server.kills;
        avatar.character = server.character;
        avatar.speed = server.character.archetype().speed;

        let dx = server.x - avatar.x;
        let dy = server.y - avatar.y;
        let dist_sq = dx * dx + dy * dy;

        if dist_sq > SNAP_DISTANCE_SQ {
            avatar.x = server.x;
            avatar.y = server.y;
            Correction::Snap
        } else if dist_sq > DRIFT_DISTANCE_SQ {
            avatar.x += dx * BLEND_FACTOR;
            avatar.y += dy * BLEND_FACTOR;
            Correction::Blend
        } else {
            Correction::None
        }
    }
}
