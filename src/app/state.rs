//! Application state shared across routes

use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Config;
use crate::game::{Arena, Broadcaster, Intent, SharedWorld, Simulation, World};
use crate::ws::registry::ConnectionRegistry;

/// Pending intents buffered between connections and the simulation
pub const INPUT_QUEUE_CAPACITY: usize = 4096;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: Arc<Arena>,
    pub world: SharedWorld,
    pub registry: Arc<ConnectionRegistry>,
    pub input_tx: mpsc::Sender<Intent>,
}

/// Background tasks the server must spawn next to the router
pub struct GameTasks {
    pub simulation: Simulation,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(config: Config) -> (Self, GameTasks) {
        Self::with_arena(config, Arena::standard())
    }

    pub fn with_arena(config: Config, arena: Arena) -> (Self, GameTasks) {
        let config = Arc::new(config);
        let arena = Arc::new(arena);

        let seed = resolve_seed(config.arena_seed);
        info!(seed, configured = config.arena_seed.is_some(), "Arena RNG seeded");

        let world = World::new(arena.clone(), seed).into_shared();
        let registry = Arc::new(ConnectionRegistry::new());
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);

        let tasks = GameTasks {
            simulation: Simulation::new(world.clone(), input_rx, registry.clone()),
            broadcaster: Broadcaster::new(world.clone(), registry.clone()),
        };

        let state = Self {
            config,
            arena,
            world,
            registry,
            input_tx,
        };

        (state, tasks)
    }
}

/// The configured seed, or a fresh one from the thread RNG
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| rand::thread_rng().gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_seed_is_used() {
        assert_eq!(resolve_seed(Some(7)), 7);
    }

    #[test]
    fn test_unset_seed_differs_between_runs() {
        assert_ne!(resolve_seed(None), resolve_seed(None));
    }
}
