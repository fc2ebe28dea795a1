//! Snapshot building and the broadcast loop

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::SNAPSHOT_INTERVAL_MICROS;
use crate::ws::protocol::{PlayerSnapshot, ProjectileSnapshot, ServerMsg};
use crate::ws::registry::ConnectionRegistry;

use super::combat::Projectile;
use super::player::Player;
use super::world::{SharedWorld, World};

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            x: p.x,
            y: p.y,
            angle: p.angle,
            health: p.health,
            max_health: p.max_health(),
            alive: p.alive,
            kills: p.kills,
            ammo: p.ammo,
            max_ammo: p.max_ammo(),
            reloading: p.reloading,
            name: p.name.clone(),
            character: p.character,
            color: p.stats.color.to_string(),
        }
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(b: &Projectile) -> Self {
        Self {
            x: b.x,
            y: b.y,
            angle: b.angle,
            size: b.radius,
            color: b.color.to_string(),
        }
    }
}

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Full `game_state` for the current world. Players are ordered by id
    /// so consecutive snapshots line up.
    pub fn build(world: &World) -> ServerMsg {
        let mut players: Vec<PlayerSnapshot> = world.players.values().map(Into::into).collect();
        players.sort_by_key(|p| p.id);

        ServerMsg::GameState {
            players,
            bullets: world.projectiles.iter().map(Into::into).collect(),
        }
    }
}

/// Snapshot stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub avg_players_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f32 / n);
    }
}

/// Periodic snapshot sender.
///
/// Holds the world read lock only while building; serialization and queueing
/// happen after it is released.
pub struct Broadcaster {
    world: SharedWorld,
    registry: Arc<ConnectionRegistry>,
    stats: SnapshotStats,
}

impl Broadcaster {
    pub fn new(world: SharedWorld, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            world,
            registry,
            stats: SnapshotStats::default(),
        }
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    /// Run at the snapshot rate until the task is aborted
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_micros(SNAPSHOT_INTERVAL_MICROS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Broadcaster started");

        loop {
            ticker.tick().await;
            self.broadcast_once();

            if self.stats.total_snapshots > 0 && self.stats.total_snapshots % 1200 == 0 {
                debug!(
                    snapshots = self.stats.total_snapshots,
                    bytes = self.stats.total_bytes,
                    avg_players = self.stats.avg_players_per_snapshot,
                    "Snapshot stats"
                );
            }
        }
    }

    /// Send one snapshot to every connection. Skipped when nobody is connected.
    pub fn broadcast_once(&mut self) {
        if self.registry.is_empty() {
            return;
        }

        let msg = {
            let world = self.world.read();
            SnapshotBuilder::build(&world)
        };

        if let ServerMsg::GameState { players, .. } = &msg {
            let bytes = serde_json::to_vec(&msg).map(|v| v.len()).unwrap_or(0);
            self.stats.record(players.len(), bytes);
        }
        self.registry.broadcast(&msg);
    }
}
