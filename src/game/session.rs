//! Session manager: turns connection intents into world changes
//!
//! Only the simulation task calls into this module, so every change lands
//! inside the single writer. Ineligible or malformed intents are dropped
//! without a reply.

use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{roster, ClientMsg, ServerMsg};

use super::archetype::Character;
use super::player::Player;
use super::world::World;
use super::{Intent, Outbound, SessionEvent};

/// Longest display name kept
pub const MAX_NAME_LEN: usize = 16;

pub struct SessionManager;

impl SessionManager {
    /// Apply one queued intent
    pub fn apply(world: &mut World, intent: Intent) -> Vec<Outbound> {
        let id = intent.connection_id;
        match intent.event {
            SessionEvent::Message(msg) => Self::handle_message(world, id, msg),
            SessionEvent::Disconnected => Self::handle_leave(world, id),
        }
    }

    fn handle_message(world: &mut World, id: Uuid, msg: ClientMsg) -> Vec<Outbound> {
        match msg {
            ClientMsg::Join { name, character } => Self::handle_join(world, id, &name, &character),
            ClientMsg::PlayerMove { x, y, angle } => {
                Self::handle_move(world, id, [x, y, angle], |p| {
                    p.angle = angle;
                    p.pending_target = Some((x, y));
                });
                Vec::new()
            }
            ClientMsg::PlayerVelocity { vx, vy, angle } => {
                Self::handle_move(world, id, [vx, vy, angle], |p| {
                    p.angle = angle;
                    p.velocity_intent = (vx, vy);
                });
                Vec::new()
            }
            ClientMsg::Shoot => {
                world.try_shoot(id);
                Vec::new()
            }
            ClientMsg::Reload => {
                if !world.is_game_over() {
                    world.start_reload(id);
                }
                Vec::new()
            }
            ClientMsg::NewGame => Self::handle_new_game(world, id),
            ClientMsg::Ping { t } => vec![Outbound::To(id, ServerMsg::Pong { t })],
        }
    }

    fn handle_join(world: &mut World, id: Uuid, name: &str, character: &str) -> Vec<Outbound> {
        let Ok(character) = character.parse::<Character>() else {
            debug!(connection_id = %id, character, "Join with unknown character ignored");
            return Vec::new();
        };

        let name = sanitize_name(name);
        if !world.add_player(id, name.clone(), character) {
            debug!(connection_id = %id, "Connection already joined");
            return Vec::new();
        }

        info!(
            connection_id = %id,
            name = %name,
            character = character.key(),
            player_count = world.players.len(),
            "Player joined"
        );

        vec![
            Outbound::To(
                id,
                ServerMsg::Joined {
                    id,
                    characters: roster(),
                },
            ),
            Outbound::All(ServerMsg::PlayerJoined { name, character }),
        ]
    }

    /// Store a movement intent for a living player. Any NaN or infinite
    /// field discards the whole message.
    fn handle_move(
        world: &mut World,
        id: Uuid,
        fields: [f32; 3],
        set_intent: impl FnOnce(&mut Player),
    ) {
        if !fields.iter().all(|v| v.is_finite()) {
            debug!(connection_id = %id, "Move with non-finite values ignored");
            return;
        }
        if world.is_game_over() {
            return;
        }
        if let Some(player) = world.players.get_mut(&id) {
            if player.alive {
                set_intent(player);
            }
        }
    }

    fn handle_new_game(world: &mut World, id: Uuid) -> Vec<Outbound> {
        if !world.is_game_over() {
            debug!(connection_id = %id, "new_game outside game over ignored");
            return Vec::new();
        }
        world.reset_match();
        vec![Outbound::All(ServerMsg::GameReset)]
    }

    fn handle_leave(world: &mut World, id: Uuid) -> Vec<Outbound> {
        match world.remove_player(id) {
            Some(player) => {
                info!(
                    connection_id = %id,
                    name = %player.name,
                    player_count = world.players.len(),
                    "Player left"
                );
                vec![Outbound::All(ServerMsg::PlayerLeft { name: player.name })]
            }
            None => Vec::new(),
        }
    }
}

/// Trimmed, length-capped display name, `"Player"` when empty
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        "Player".to_string()
    } else {
        name
    }
}
