//! Combat system - weapons, projectiles, hit detection

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use super::arena::Arena;
use super::geometry::{circle_intersects_circle, distance_sq, nearest_point_on_segment};
use super::player::{Player, PLAYER_RADIUS};

/// Projectile travel per tick, shared by every weapon
pub const BULLET_SPEED: f32 = 12.0;
/// Distance after which a projectile expires
pub const MAX_RANGE: f32 = 900.0;
/// Radius used for projectile vs wall tests
pub const WALL_HIT_RADIUS: f32 = 3.0;
/// Projectiles spawn this far ahead of the shooter along the aim
pub const MUZZLE_OFFSET: f32 = 20.0;
/// Kills needed to win the match
pub const WIN_KILLS: u32 = 15;
/// Delay between death and respawn
pub const RESPAWN_DELAY_MS: u64 = 3000;

/// Active projectile in the game
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub owner_id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Start of the path covered by the latest step. For a fresh shot this
    /// is the shooter's position, so the muzzle gap is swept too.
    pub from_x: f32,
    pub from_y: f32,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub traveled: f32,
    pub max_range: f32,
    pub color: &'static str,
}

impl Projectile {
    pub fn new(id: u64, owner: &Player, x: f32, y: f32, angle: f32, damage: f32) -> Self {
        Self {
            id,
            owner_id: owner.id,
            x,
            y,
            from_x: x,
            from_y: y,
            angle,
            speed: BULLET_SPEED,
            damage,
            radius: owner.stats.bullet_size,
            traveled: 0.0,
            max_range: MAX_RANGE,
            color: owner.stats.color,
        }
    }

    /// Fired from `(x, y)`: the first step's path starts there
    pub fn fired_from(mut self, x: f32, y: f32) -> Self {
        self.from_x = x;
        self.from_y = y;
        self
    }

    /// Move one tick along the fixed angle
    pub fn advance(&mut self) {
        if self.traveled > 0.0 {
            self.from_x = self.x;
            self.from_y = self.y;
        }
        self.x += self.angle.cos() * self.speed;
        self.y += self.angle.sin() * self.speed;
        self.traveled += self.speed;
    }

    /// Left the map, outran its range, or hit a wall
    pub fn expired(&self, arena: &Arena) -> bool {
        arena.out_of_bounds(self.x, self.y)
            || self.traveled > self.max_range
            || arena.blocked(self.x, self.y, WALL_HIT_RADIUS)
    }

    /// Check collision with a player-sized target anywhere along the
    /// latest step's path (touching does not count)
    pub fn check_hit(&self, target_x: f32, target_y: f32) -> bool {
        let (px, py) =
            nearest_point_on_segment(self.from_x, self.from_y, self.x, self.y, target_x, target_y);
        circle_intersects_circle(px, py, self.radius, target_x, target_y, PLAYER_RADIUS)
    }
}

/// Combat system for managing weapons and damage
pub struct CombatSystem;

impl CombatSystem {
    /// Alive, not reloading, has ammo, and off cooldown
    pub fn can_fire(player: &Player, now_ms: u64) -> bool {
        player.alive
            && !player.reloading
            && player.ammo > 0
            && player
                .last_shot_ms
                .map_or(true, |last| now_ms.saturating_sub(last) >= player.stats.fire_rate_ms)
    }

    pub fn can_reload(player: &Player) -> bool {
        !player.reloading && player.ammo < player.max_ammo()
    }

    /// Pull the trigger. On success consumes one round and returns the
    /// spawned pellets; the caller starts a reload when ammo hits zero.
    pub fn fire<R: Rng>(
        player: &mut Player,
        now_ms: u64,
        rng: &mut R,
        next_id: &mut u64,
    ) -> Option<Vec<Projectile>> {
        if !Self::can_fire(player, now_ms) {
            return None;
        }

        player.last_shot_ms = Some(now_ms);
        player.ammo -= 1;

        let stats = player.stats;
        let muzzle_x = player.x + player.angle.cos() * MUZZLE_OFFSET;
        let muzzle_y = player.y + player.angle.sin() * MUZZLE_OFFSET;
        let damage = stats.damage_per_pellet();

        let pellets = (0..stats.pellet_count.max(1))
            .map(|_| {
                let angle = if stats.spread_radians > 0.0 {
                    player.angle + (rng.gen::<f32>() - 0.5) * stats.spread_radians
                } else {
                    player.angle
                };
                let id = *next_id;
                *next_id += 1;
                Projectile::new(id, player, muzzle_x, muzzle_y, angle, damage)
                    .fired_from(player.x, player.y)
            })
            .collect();

        Some(pellets)
    }

    /// Pick the player this projectile hits, if any.
    ///
    /// Candidates are living players other than the owner. When several
    /// overlap, the one nearest the start of the path wins and ties go to
    /// the smaller id.
    pub fn find_target(projectile: &Projectile, players: &HashMap<Uuid, Player>) -> Option<Uuid> {
        players
            .values()
            .filter(|p| p.alive && p.id != projectile.owner_id)
            .filter(|p| projectile.check_hit(p.x, p.y))
            .map(|p| (distance_sq(projectile.from_x, projectile.from_y, p.x, p.y), p.id))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}
