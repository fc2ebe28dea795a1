//! Character archetypes: per-character movement and weapon parameters
//!
//! Every weapon difference is data in [`Archetype`]; the combat code has no
//! per-character branches.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selectable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Character {
    /// Assault rifle, all-rounder
    Andree,
    /// Shotgun burst, slow and tanky
    Chesney,
    /// SMG, fast and fragile
    Denver,
    /// Sniper, one heavy round
    Fishcer,
    /// Revolver
    Maybelle,
}

impl Character {
    pub const ALL: [Character; 5] = [
        Character::Andree,
        Character::Chesney,
        Character::Denver,
        Character::Fishcer,
        Character::Maybelle,
    ];

    pub fn key(self) -> &'static str {
        self.archetype().name
    }

    pub fn archetype(self) -> Archetype {
        Archetype::for_character(self)
    }
}

impl FromStr for Character {
    type Err = UnknownCharacter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Character::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or(UnknownCharacter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown character")]
pub struct UnknownCharacter;

/// Stats for one character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub name: &'static str,
    pub color: &'static str,
    pub weapon: &'static str,
    pub max_health: f32,
    /// Movement speed in units per reference tick
    pub speed: f32,
    /// Damage per trigger pull, split across pellets
    pub damage: f32,
    pub reload_ms: u64,
    pub max_ammo: u32,
    /// Projectile radius
    pub bullet_size: f32,
    /// Minimum milliseconds between accepted shots
    pub fire_rate_ms: u64,
    /// Projectiles spawned per trigger pull
    pub pellet_count: u32,
    /// Total angular width of the pellet fan in radians
    pub spread_radians: f32,
}

impl Archetype {
    pub fn for_character(character: Character) -> Self {
        match character {
            Character::Andree => Self {
                name: "Andree",
                color: "#00e5ff",
                weapon: "Assault Rifle",
                max_health: 100.0,
                speed: 3.5,
                damage: 22.0,
                reload_ms: 1200,
                max_ammo: 12,
                bullet_size: 4.0,
                fire_rate_ms: 150,
                pellet_count: 1,
                spread_radians: 0.0,
            },
            Character::Chesney => Self {
                name: "Chesney",
                color: "#ff6b35",
                weapon: "Shotgun Burst",
                max_health: 140.0,
                speed: 2.6,
                damage: 45.0,
                reload_ms: 2200,
                max_ammo: 6,
                bullet_size: 7.0,
                fire_rate_ms: 600,
                pellet_count: 5,
                spread_radians: 0.25,
            },
            Character::Denver => Self {
                name: "Denver",
                color: "#b5ff4d",
                weapon: "SMG",
                max_health: 80.0,
                speed: 4.5,
                damage: 15.0,
                reload_ms: 800,
                max_ammo: 20,
                bullet_size: 3.0,
                fire_rate_ms: 80,
                pellet_count: 1,
                spread_radians: 0.0,
            },
            Character::Fishcer => Self {
                name: "Fishcer",
                color: "#e040fb",
                weapon: "Sniper",
                max_health: 90.0,
                speed: 3.0,
                damage: 70.0,
                reload_ms: 2500,
                max_ammo: 5,
                bullet_size: 5.0,
                fire_rate_ms: 800,
                pellet_count: 1,
                spread_radians: 0.0,
            },
            Character::Maybelle => Self {
                name: "Maybelle",
                color: "#ffeb3b",
                weapon: "Revolver",
                max_health: 110.0,
                speed: 3.2,
                damage: 30.0,
                reload_ms: 1500,
                max_ammo: 8,
                bullet_size: 5.0,
                fire_rate_ms: 400,
                pellet_count: 1,
                spread_radians: 0.0,
            },
        }
    }

    pub fn damage_per_pellet(&self) -> f32 {
        self.damage / self.pellet_count.max(1) as f32
    }
}
