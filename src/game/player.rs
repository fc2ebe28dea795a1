//! Authoritative player record

use uuid::Uuid;

use super::archetype::{Archetype, Character};

/// Collision radius shared by every character
pub const PLAYER_RADIUS: f32 = 14.0;

/// Player state (owned by the simulation, mutated only inside a tick)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub character: Character,
    pub stats: Archetype,

    // Transform
    pub x: f32,
    pub y: f32,
    pub angle: f32,

    // Combat
    pub health: f32,
    pub ammo: u32,
    pub alive: bool,
    pub kills: u32,
    pub reloading: bool,
    /// Simulation time of the last accepted shot
    pub last_shot_ms: Option<u64>,

    // Movement intent, consumed by the movement phase
    /// Held direction, magnitude at most 1; persists until replaced
    pub velocity_intent: (f32, f32),
    /// One-shot absolute target from a position-style move
    pub pending_target: Option<(f32, f32)>,
}

impl Player {
    pub fn new(id: Uuid, name: String, character: Character, spawn_x: f32, spawn_y: f32) -> Self {
        let stats = character.archetype();
        Self {
            id,
            name,
            character,
            stats,
            x: spawn_x,
            y: spawn_y,
            angle: 0.0,
            health: stats.max_health,
            ammo: stats.max_ammo,
            alive: true,
            kills: 0,
            reloading: false,
            last_shot_ms: None,
            velocity_intent: (0.0, 0.0),
            pending_target: None,
        }
    }

    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    pub fn max_ammo(&self) -> u32 {
        self.stats.max_ammo
    }

    /// Put the player back into play at a spawn location
    pub fn respawn_at(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.health = self.stats.max_health;
        self.ammo = self.stats.max_ammo;
        self.alive = true;
        self.velocity_intent = (0.0, 0.0);
        self.pending_target = None;
    }

    /// Full match reset: respawn plus cleared score and reload state
    pub fn reset_for_new_match(&mut self, x: f32, y: f32) {
        self.respawn_at(x, y);
        self.kills = 0;
        self.reloading = false;
        self.last_shot_ms = None;
    }

    /// Apply damage and report whether this hit was lethal.
    /// Health never drops below zero.
    pub fn take_damage(&mut self, damage: f32) -> bool {
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            self.velocity_intent = (0.0, 0.0);
            self.pending_target = None;
            true
        } else {
            false
        }
    }
}
