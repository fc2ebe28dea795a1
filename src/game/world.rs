//! World state and the authoritative tick step

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use uuid::Uuid;

use crate::util::time::TICK_DURATION_MICROS;
use crate::ws::protocol::ServerMsg;

use super::arena::Arena;
use super::archetype::Character;
use super::combat::{CombatSystem, Projectile, RESPAWN_DELAY_MS, WIN_KILLS};
use super::physics::PhysicsSystem;
use super::player::{Player, PLAYER_RADIUS};
use super::schedule::{DeferredEffect, Scheduler};
use super::Outbound;

/// World handle shared by the simulation (writer) and broadcaster (reader)
pub type SharedWorld = Arc<RwLock<World>>;

/// Match winner
#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub id: Uuid,
    pub name: String,
    pub character: Character,
}

/// Match-level flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchState {
    pub game_over: bool,
    pub winner: Option<Winner>,
}

/// Everything the simulation owns
pub struct World {
    pub arena: Arc<Arena>,
    pub tick: u64,
    /// Simulation clock in milliseconds; frozen while game over
    pub now_ms: u64,
    /// Same clock at full precision, so whole-millisecond reads never run
    /// ahead of the tick cadence
    elapsed_us: u64,
    pub players: HashMap<Uuid, Player>,
    pub projectiles: Vec<Projectile>,
    pub match_state: MatchState,
    pub scheduler: Scheduler,
    rng: ChaCha8Rng,
    next_projectile_id: u64,
}

impl World {
    pub fn new(arena: Arc<Arena>, seed: u64) -> Self {
        Self {
            arena,
            tick: 0,
            now_ms: 0,
            elapsed_us: 0,
            players: HashMap::new(),
            projectiles: Vec::new(),
            match_state: MatchState::default(),
            scheduler: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_projectile_id: 0,
        }
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    pub fn is_game_over(&self) -> bool {
        self.match_state.game_over
    }

    /// Uniformly random spawn point; the map centre if none are declared
    pub fn random_spawn(&mut self) -> (f32, f32) {
        let spawns = &self.arena.spawn_points;
        if spawns.is_empty() {
            return (self.arena.width / 2.0, self.arena.height / 2.0);
        }
        let sp = spawns[self.rng.gen_range(0..spawns.len())];
        (sp.x, sp.y)
    }

    /// Create a player at a random spawn point. Returns false if the id is taken.
    pub fn add_player(&mut self, id: Uuid, name: String, character: Character) -> bool {
        if self.players.contains_key(&id) {
            return false;
        }
        let (x, y) = self.random_spawn();
        self.players.insert(id, Player::new(id, name, character, x, y));
        true
    }

    /// Remove a player. Their projectiles stay in flight.
    pub fn remove_player(&mut self, id: Uuid) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Attempt a shot for `id`, starting a reload when the magazine empties
    pub fn try_shoot(&mut self, id: Uuid) -> bool {
        if self.match_state.game_over {
            return false;
        }
        let now = self.now_ms;
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        let Some(pellets) =
            CombatSystem::fire(player, now, &mut self.rng, &mut self.next_projectile_id)
        else {
            return false;
        };
        let empty = player.ammo == 0;

        self.projectiles.extend(pellets);
        if empty {
            self.start_reload(id);
        }
        true
    }

    /// Begin a reload that completes after the weapon's reload time
    pub fn start_reload(&mut self, id: Uuid) -> bool {
        let now = self.now_ms;
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        if !CombatSystem::can_reload(player) {
            return false;
        }
        player.reloading = true;
        self.scheduler.schedule(
            now + player.stats.reload_ms,
            DeferredEffect::ReloadComplete { player_id: id },
        );
        true
    }

    /// Start a fresh match with everyone still connected
    pub fn reset_match(&mut self) {
        self.match_state = MatchState::default();
        self.projectiles.clear();
        self.scheduler.clear();

        let mut ids: Vec<Uuid> = self.players.keys().copied().collect();
        ids.sort();
        for id in ids {
            let (x, y) = self.random_spawn();
            if let Some(player) = self.players.get_mut(&id) {
                player.reset_for_new_match(x, y);
            }
        }
        info!(players = self.players.len(), "Match reset");
    }

    /// Run a single simulation tick.
    ///
    /// Order: deferred effects, movement, projectiles. A no-op while game over.
    pub fn step(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.match_state.game_over {
            return out;
        }

        self.tick += 1;
        self.elapsed_us += TICK_DURATION_MICROS;
        self.now_ms = self.elapsed_us / 1000;

        self.apply_deferred(&mut out);
        self.update_movement();
        self.update_combat(&mut out);

        out
    }

    fn apply_deferred(&mut self, out: &mut Vec<Outbound>) {
        for effect in self.scheduler.drain_due(self.now_ms) {
            match effect {
                DeferredEffect::Respawn { player_id } => {
                    if !self.players.contains_key(&player_id) {
                        continue;
                    }
                    let (x, y) = self.random_spawn();
                    if let Some(player) = self.players.get_mut(&player_id) {
                        player.respawn_at(x, y);
                        out.push(Outbound::All(ServerMsg::PlayerRespawn { id: player_id }));
                    }
                }
                DeferredEffect::ReloadComplete { player_id } => {
                    if let Some(player) = self.players.get_mut(&player_id) {
                        player.ammo = player.max_ammo();
                        player.reloading = false;
                    }
                }
            }
        }
    }

    fn update_movement(&mut self) {
        let arena = &self.arena;
        for player in self.players.values_mut() {
            if !player.alive {
                continue;
            }

            let (x, y) = match player.pending_target.take() {
                Some((tx, ty)) => PhysicsSystem::step_toward_target(
                    arena,
                    PLAYER_RADIUS,
                    player.x,
                    player.y,
                    tx,
                    ty,
                    player.stats.speed,
                ),
                None => {
                    let (vx, vy) = player.velocity_intent;
                    PhysicsSystem::step_velocity(
                        arena,
                        PLAYER_RADIUS,
                        player.x,
                        player.y,
                        vx,
                        vy,
                        player.stats.speed,
                    )
                }
            };
            player.x = x;
            player.y = y;
        }
    }

    fn update_combat(&mut self, out: &mut Vec<Outbound>) {
        let mut projectiles = std::mem::take(&mut self.projectiles);

        projectiles.retain_mut(|projectile| {
            projectile.advance();
            if projectile.expired(&self.arena) {
                return false;
            }
            match CombatSystem::find_target(projectile, &self.players) {
                Some(victim_id) => {
                    self.resolve_hit(projectile, victim_id, out);
                    false
                }
                None => true,
            }
        });

        self.projectiles = projectiles;
    }

    fn resolve_hit(&mut self, projectile: &Projectile, victim_id: Uuid, out: &mut Vec<Outbound>) {
        let Some(victim) = self.players.get_mut(&victim_id) else {
            return;
        };

        let killed = victim.take_damage(projectile.damage);
        out.push(Outbound::To(
            victim_id,
            ServerMsg::HitConfirm {
                health: victim.health,
            },
        ));
        if !killed {
            return;
        }

        let victim_name = victim.name.clone();
        self.scheduler.schedule(
            self.now_ms + RESPAWN_DELAY_MS,
            DeferredEffect::Respawn {
                player_id: victim_id,
            },
        );

        // Credit needs a connected shooter; the victim dies either way.
        let Some(shooter) = self.players.get_mut(&projectile.owner_id) else {
            info!(victim = %victim_name, "Player killed by a departed shooter");
            return;
        };
        shooter.kills += 1;
        info!(killer = %shooter.name, victim = %victim_name, kills = shooter.kills, "Player killed");

        out.push(Outbound::All(ServerMsg::KillFeed {
            killer: shooter.name.clone(),
            victim: victim_name,
            killer_character: shooter.character,
        }));

        if shooter.kills >= WIN_KILLS && !self.match_state.game_over {
            let winner = Winner {
                id: shooter.id,
                name: shooter.name.clone(),
                character: shooter.character,
            };
            info!(winner = %winner.name, "Game over");
            out.push(Outbound::All(ServerMsg::GameOver {
                winner: winner.name.clone(),
                character: winner.character,
            }));
            self.match_state.game_over = true;
            self.match_state.winner = Some(winner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::MUZZLE_OFFSET;
    use crate::util::time::SIMULATION_TPS;

    fn world() -> World {
        World::new(Arc::new(Arena::standard()), 42)
    }

    fn join(world: &mut World, name: &str, character: Character) -> Uuid {
        let id = Uuid::new_v4();
        assert!(world.add_player(id, name.to_string(), character));
        id
    }

    /// Put `victim` directly in the line of fire, one tick of travel ahead
    /// of the muzzle, in an open area of the map.
    fn line_up(world: &mut World, shooter: Uuid, victim: Uuid) {
        let s = world.players.get_mut(&shooter).unwrap();
        s.x = 600.0;
        s.y = 500.0;
        s.angle = 0.0;
        let v = world.players.get_mut(&victim).unwrap();
        v.x = 600.0 + MUZZLE_OFFSET + 12.0;
        v.y = 500.0;
    }

    fn step_for(world: &mut World, ms: u64) -> Vec<Outbound> {
        let target = world.now_ms + ms;
        let mut out = Vec::new();
        while world.now_ms < target {
            out.extend(world.step());
        }
        out
    }

    #[test]
    fn test_players_spawn_on_declared_points() {
        let mut w = world();
        for i in 0..20 {
            let id = join(&mut w, &format!("p{i}"), Character::Andree);
            let p = &w.players[&id];
            assert!(w
                .arena
                .spawn_points
                .iter()
                .any(|sp| sp.x == p.x && sp.y == p.y));
        }
    }

    #[test]
    fn test_clock_never_runs_ahead_of_real_time() {
        let mut w = world();
        for _ in 0..SIMULATION_TPS {
            w.step();
        }
        assert_eq!(w.now_ms, 999);

        // The respawn delay needs a full 3 s worth of ticks
        let mut w = world();
        for _ in 0..180 {
            w.step();
        }
        assert!(w.now_ms < RESPAWN_DELAY_MS);
        w.step();
        assert!(w.now_ms >= RESPAWN_DELAY_MS);
    }

    #[test]
    fn test_duplicate_join_is_rejected() {
        let mut w = world();
        let id = join(&mut w, "a", Character::Andree);
        assert!(!w.add_player(id, "b".into(), Character::Denver));
        assert_eq!(w.players[&id].name, "a");
    }

    #[test]
    fn test_velocity_intent_moves_each_tick() {
        let mut w = world();
        let id = join(&mut w, "a", Character::Andree);
        {
            let p = w.players.get_mut(&id).unwrap();
            p.x = 600.0;
            p.y = 500.0;
            p.velocity_intent = (1.0, 0.0);
        }
        w.step();
        w.step();
        assert_eq!(w.players[&id].x, 607.0);
    }

    #[test]
    fn test_dead_players_do_not_move() {
        let mut w = world();
        let id = join(&mut w, "a", Character::Andree);
        let p = w.players.get_mut(&id).unwrap();
        p.velocity_intent = (1.0, 0.0);
        p.alive = false;
        let before = (p.x, p.y);
        w.step();
        assert_eq!((w.players[&id].x, w.players[&id].y), before);
    }

    #[test]
    fn test_ammo_and_auto_reload() {
        let mut w = world();
        let id = join(&mut w, "a", Character::Fishcer);
        let mag = w.players[&id].max_ammo();

        for n in 1..mag {
            assert!(w.try_shoot(id));
            assert_eq!(w.players[&id].ammo, mag - n);
            step_for(&mut w, 800);
        }
        assert!(!w.players[&id].reloading);

        assert!(w.try_shoot(id));
        assert_eq!(w.players[&id].ammo, 0);
        assert!(w.players[&id].reloading);

        step_for(&mut w, 800);
        assert!(!w.try_shoot(id), "cannot fire while reloading");

        step_for(&mut w, 2500);
        let p = &w.players[&id];
        assert_eq!(p.ammo, mag);
        assert!(!p.reloading);
    }

    #[test]
    fn test_manual_reload_gating() {
        let mut w = world();
        let id = join(&mut w, "a", Character::Andree);
        assert!(!w.start_reload(id), "full magazine");
        w.try_shoot(id);
        assert!(w.start_reload(id));
        assert!(!w.start_reload(id), "already reloading");
        assert_eq!(w.scheduler.len(), 1);
    }

    #[test]
    fn test_hit_confirm_goes_to_victim_only() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Andree);
        let victim = join(&mut w, "y", Character::Andree);
        line_up(&mut w, shooter, victim);

        assert!(w.try_shoot(shooter));
        let out = w.step();

        assert_eq!(w.players[&victim].health, 78.0);
        assert_eq!(
            out,
            vec![Outbound::To(victim, ServerMsg::HitConfirm { health: 78.0 })]
        );
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn test_overlapping_target_is_hit_on_first_step() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Andree);
        let victim = join(&mut w, "y", Character::Andree);
        for id in [shooter, victim] {
            let p = w.players.get_mut(&id).unwrap();
            p.x = 600.0;
            p.y = 500.0;
            p.angle = 0.0;
        }

        assert!(w.try_shoot(shooter));
        let out = w.step();

        let damage = Character::Andree.archetype().damage_per_pellet();
        assert_eq!(w.players[&victim].health, 100.0 - damage);
        assert_eq!(
            out,
            vec![Outbound::To(
                victim,
                ServerMsg::HitConfirm {
                    health: 100.0 - damage
                }
            )]
        );
        assert_eq!(w.players[&shooter].health, 100.0);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn test_self_hit_is_excluded() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Andree);
        {
            let s = w.players.get_mut(&shooter).unwrap();
            s.x = 600.0;
            s.y = 500.0;
        }
        assert!(w.try_shoot(shooter));
        // Pull the shooter onto the projectile's path.
        w.players.get_mut(&shooter).unwrap().x = 632.0;
        let out = w.step();
        assert!(out.is_empty());
        assert_eq!(w.players[&shooter].health, 100.0);
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn test_kill_schedules_one_respawn() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Fishcer);
        let victim = join(&mut w, "y", Character::Denver);
        line_up(&mut w, shooter, victim);
        w.players.get_mut(&victim).unwrap().health = 50.0;

        w.try_shoot(shooter);
        let out = w.step();

        assert_eq!(
            out,
            vec![
                Outbound::To(victim, ServerMsg::HitConfirm { health: 0.0 }),
                Outbound::All(ServerMsg::KillFeed {
                    killer: "x".into(),
                    victim: "y".into(),
                    killer_character: Character::Fishcer,
                }),
            ]
        );
        assert!(!w.players[&victim].alive);
        assert_eq!(w.players[&shooter].kills, 1);
        assert_eq!(
            w.scheduler
                .count(&DeferredEffect::Respawn { player_id: victim }),
            1
        );

        let out = step_for(&mut w, RESPAWN_DELAY_MS);
        assert_eq!(
            out,
            vec![Outbound::All(ServerMsg::PlayerRespawn { id: victim })]
        );
        let v = &w.players[&victim];
        assert!(v.alive);
        assert_eq!(v.health, v.max_health());
        assert!(w.arena.spawn_points.iter().any(|sp| sp.x == v.x && sp.y == v.y));
    }

    #[test]
    fn test_respawn_skipped_after_disconnect() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Fishcer);
        let victim = join(&mut w, "y", Character::Denver);
        line_up(&mut w, shooter, victim);
        w.players.get_mut(&victim).unwrap().health = 1.0;
        w.try_shoot(shooter);
        w.step();
        w.remove_player(victim);

        let out = step_for(&mut w, RESPAWN_DELAY_MS);
        assert!(out.is_empty());
        assert!(w.scheduler.is_empty());
    }

    #[test]
    fn test_projectile_survives_owner_disconnect() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Andree);
        let victim = join(&mut w, "y", Character::Andree);
        line_up(&mut w, shooter, victim);
        w.players.get_mut(&victim).unwrap().health = 5.0;

        w.try_shoot(shooter);
        w.remove_player(shooter);
        let out = w.step();

        // Victim still dies, but nobody is credited.
        assert_eq!(
            out,
            vec![Outbound::To(victim, ServerMsg::HitConfirm { health: 0.0 })]
        );
        assert!(!w.players[&victim].alive);
    }

    #[test]
    fn test_win_threshold_latches_game_over() {
        let mut w = world();
        let shooter = join(&mut w, "x", Character::Fishcer);
        let victim = join(&mut w, "y", Character::Denver);
        w.players.get_mut(&shooter).unwrap().kills = WIN_KILLS - 1;
        line_up(&mut w, shooter, victim);
        w.players.get_mut(&victim).unwrap().health = 10.0;

        w.try_shoot(shooter);
        let out = w.step();
        let game_overs = out
            .iter()
            .filter(|o| matches!(o.msg(), ServerMsg::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        assert!(w.is_game_over());
        assert_eq!(w.match_state.winner.as_ref().map(|w| w.id), Some(shooter));

        // Frozen: no clock, no shots, no events.
        let now = w.now_ms;
        assert!(w.step().is_empty());
        assert_eq!(w.now_ms, now);
        assert!(!w.try_shoot(shooter));
    }

    #[test]
    fn test_reset_restores_everyone() {
        let mut w = world();
        let a = join(&mut w, "a", Character::Andree);
        let b = join(&mut w, "b", Character::Chesney);
        {
            let p = w.players.get_mut(&a).unwrap();
            p.kills = WIN_KILLS;
            p.ammo = 0;
            p.reloading = true;
        }
        w.players.get_mut(&b).unwrap().take_damage(1000.0);
        w.try_shoot(b);
        w.match_state.game_over = true;
        w.scheduler
            .schedule(10, DeferredEffect::Respawn { player_id: b });

        w.reset_match();

        assert!(!w.is_game_over());
        assert!(w.match_state.winner.is_none());
        assert!(w.projectiles.is_empty());
        assert!(w.scheduler.is_empty());
        for p in w.players.values() {
            assert!(p.alive);
            assert_eq!(p.kills, 0);
            assert_eq!(p.health, p.max_health());
            assert_eq!(p.ammo, p.max_ammo());
            assert!(!p.reloading);
        }
    }
}
