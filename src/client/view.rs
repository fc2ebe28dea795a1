//! Client-side view of the match, fed by server messages

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use uuid::Uuid;

use crate::game::archetype::Character;
use crate::game::Arena;
use crate::ws::protocol::{CharacterInfo, PlayerSnapshot, ProjectileSnapshot, ServerMsg};

use super::prediction::{Correction, Predictor};

/// Kill feed entries kept for display
pub const KILL_FEED_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct KillFeedEntry {
    pub killer: String,
    pub victim: String,
    pub killer_character: Character,
}

/// Position of another player for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePosition {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Everything a client knows about the match.
///
/// Messages must be applied in arrival order.
pub struct ClientView {
    pub local_id: Option<Uuid>,
    pub characters: Vec<CharacterInfo>,
    pub predictor: Predictor,
    /// Latest authoritative state of everyone else
    pub remotes: HashMap<Uuid, PlayerSnapshot>,
    previous_remotes: HashMap<Uuid, PlayerSnapshot>,
    pub bullets: Vec<ProjectileSnapshot>,
    pub kill_feed: VecDeque<KillFeedEntry>,
    pub game_over: Option<(String, Character)>,
    pub last_correction: Option<Correction>,
}

impl ClientView {
    pub fn new() -> Self {
        Self {
            local_id: None,
            characters: Vec::new(),
            predictor: Predictor::new(Arc::new(Arena::from_map(0.0, 0.0, Vec::new()))),
            remotes: HashMap::new(),
            previous_remotes: HashMap::new(),
            bullets: Vec::new(),
            kill_feed: VecDeque::with_capacity(KILL_FEED_LEN),
            game_over: None,
            last_correction: None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn apply(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::MapData {
                walls,
                width,
                height,
            } => {
                self.predictor
                    .set_arena(Arc::new(Arena::from_map(width, height, walls)));
            }
            ServerMsg::Joined { id, characters } => {
                self.local_id = Some(id);
                self.characters = characters;
                self.predictor.clear();
            }
            ServerMsg::GameState { players, bullets } => self.apply_state(players, bullets),
            ServerMsg::HitConfirm { health } => self.predictor.set_health(health),
            ServerMsg::KillFeed {
                killer,
                victim,
                killer_character,
            } => {
                if self.kill_feed.len() == KILL_FEED_LEN {
                    self.kill_feed.pop_front();
                }
                self.kill_feed.push_back(KillFeedEntry {
                    killer,
                    victim,
                    killer_character,
                });
            }
            ServerMsg::GameOver { winner, character } => {
                self.game_over = Some((winner, character));
            }
            ServerMsg::GameReset => {
                self.game_over = None;
            }
            ServerMsg::PlayerRespawn { .. }
            | ServerMsg::PlayerJoined { .. }
            | ServerMsg::PlayerLeft { .. }
            | ServerMsg::Pong { .. } => {}
        }
    }

    fn apply_state(&mut self, players: Vec<PlayerSnapshot>, bullets: Vec<ProjectileSnapshot>) {
        self.previous_remotes = std::mem::take(&mut self.remotes);
        self.bullets = bullets;

        for player in players {
            if Some(player.id) == self.local_id {
                self.last_correction = Some(self.predictor.reconcile(&player));
            } else {
                self.remotes.insert(player.id, player);
            }
        }
    }

    /// Remote players blended between the last two snapshots.
    ///
    /// `alpha` runs from 0 (previous snapshot) to 1 (latest). Players new
    /// in the latest snapshot are shown where it puts them.
    pub fn interpolated_remotes(&self, alpha: f32) -> Vec<RemotePosition> {
        let alpha = alpha.clamp(0.0, 1.0);
        let mut out: Vec<RemotePosition> = self
            .remotes
            .values()
            .map(|now| match self.previous_remotes.get(&now.id) {
                Some(prev) if prev.alive && now.alive => RemotePosition {
                    id: now.id,
                    x: lerp(prev.x, now.x, alpha),
                    y: lerp(prev.y, now.y, alpha),
                    angle: lerp_angle(prev.angle, now.angle, alpha),
                },
                _ => RemotePosition {
                    id: now.id,
                    x: now.x,
                    y: now.y,
                    angle: now.angle,
                },
            })
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }
}

impl Default for ClientView {
    fn default() -> Self {
        Self::new()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate along the shorter arc
fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut diff = (b - a) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    a + diff * t
}
