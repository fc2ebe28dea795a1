//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::archetype::{Archetype, Character};
use crate::game::geometry::Rect;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Enter the arena with a display name and character key
    Join {
        #[serde(default)]
        name: String,
        /// Character key, e.g. "Andree"; unknown keys are ignored
        character: String,
    },

    /// Proposed absolute position plus facing
    PlayerMove { x: f32, y: f32, angle: f32 },

    /// Held movement direction (length at most 1) plus facing
    PlayerVelocity { vx: f32, vy: f32, angle: f32 },

    /// Pull the trigger once
    Shoot,

    /// Start a manual reload
    Reload,

    /// Restart after game over
    NewGame,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Arena geometry, sent once right after connecting
    MapData {
        walls: Vec<Rect>,
        width: f32,
        height: f32,
    },

    /// Join handshake completed
    Joined {
        id: Uuid,
        characters: Vec<CharacterInfo>,
    },

    /// World state (sent at the snapshot rate)
    GameState {
        players: Vec<PlayerSnapshot>,
        bullets: Vec<ProjectileSnapshot>,
    },

    /// Sent only to the player who was just hit
    HitConfirm { health: f32 },

    KillFeed {
        killer: String,
        victim: String,
        killer_character: Character,
    },

    PlayerRespawn { id: Uuid },

    GameOver { winner: String, character: Character },

    GameReset,

    PlayerJoined { name: String, character: Character },

    PlayerLeft { name: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Character stats as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub name: String,
    pub color: String,
    pub weapon: String,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    pub reload_ms: u64,
    pub max_ammo: u32,
    pub bullet_size: f32,
    pub fire_rate_ms: u64,
    pub pellet_count: u32,
    pub spread_radians: f32,
}

impl From<Archetype> for CharacterInfo {
    fn from(a: Archetype) -> Self {
        Self {
            name: a.name.to_string(),
            color: a.color.to_string(),
            weapon: a.weapon.to_string(),
            max_health: a.max_health,
            speed: a.speed,
            damage: a.damage,
            reload_ms: a.reload_ms,
            max_ammo: a.max_ammo,
            bullet_size: a.bullet_size,
            fire_rate_ms: a.fire_rate_ms,
            pellet_count: a.pellet_count,
            spread_radians: a.spread_radians,
        }
    }
}

/// The full character table
pub fn roster() -> Vec<CharacterInfo> {
    Character::ALL
        .iter()
        .map(|c| CharacterInfo::from(c.archetype()))
        .collect()
}

/// Player state in a snapshot.
///
/// Encoded as a positional array:
/// `[id, x, y, angle, health, maxHealth, alive, kills, ammo, maxAmmo, reloading, name, character, color]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PlayerRow", from = "PlayerRow")]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub kills: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,
    pub name: String,
    pub character: Character,
    pub color: String,
}

#[derive(Serialize, Deserialize)]
struct PlayerRow(
    Uuid,
    i32,
    i32,
    f32,
    f32,
    f32,
    u8,
    u32,
    u32,
    u32,
    u8,
    String,
    Character,
    String,
);

impl From<PlayerSnapshot> for PlayerRow {
    fn from(p: PlayerSnapshot) -> Self {
        PlayerRow(
            p.id,
            p.x.round() as i32,
            p.y.round() as i32,
            round_to(p.angle, 100.0),
            round_to(p.health, 10.0),
            p.max_health,
            p.alive as u8,
            p.kills,
            p.ammo,
            p.max_ammo,
            p.reloading as u8,
            p.name,
            p.character,
            p.color,
        )
    }
}

impl From<PlayerRow> for PlayerSnapshot {
    fn from(r: PlayerRow) -> Self {
        Self {
            id: r.0,
            x: r.1 as f32,
            y: r.2 as f32,
            angle: r.3,
            health: r.4,
            max_health: r.5,
            alive: r.6 != 0,
            kills: r.7,
            ammo: r.8,
            max_ammo: r.9,
            reloading: r.10 != 0,
            name: r.11,
            character: r.12,
            color: r.13,
        }
    }
}

/// Projectile state in a snapshot, encoded as `[x, y, angle, size, color]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ProjectileRow", from = "ProjectileRow")]
pub struct ProjectileSnapshot {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub size: f32,
    pub color: String,
}

#[derive(Serialize, Deserialize)]
struct ProjectileRow(i32, i32, f32, f32, String);

impl From<ProjectileSnapshot> for ProjectileRow {
    fn from(b: ProjectileSnapshot) -> Self {
        ProjectileRow(
            b.x.round() as i32,
            b.y.round() as i32,
            round_to(b.angle, 100.0),
            b.size,
            b.color,
        )
    }
}

impl From<ProjectileRow> for ProjectileSnapshot {
    fn from(r: ProjectileRow) -> Self {
        Self {
            x: r.0 as f32,
            y: r.1 as f32,
            angle: r.2,
            size: r.3,
            color: r.4,
        }
    }
}

fn round_to(value: f32, scale: f32) -> f32 {
    (value * scale).round() / scale
}
