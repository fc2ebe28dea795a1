//! Game simulation modules

pub mod arena;
pub mod archetype;
pub mod combat;
pub mod geometry;
pub mod physics;
pub mod player;
pub mod schedule;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod world;

pub use arena::Arena;
pub use archetype::{Archetype, Character};
pub use player::Player;
pub use simulation::Simulation;
pub use snapshot::Broadcaster;
pub use world::{SharedWorld, World};

use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Something a connection did, queued for the simulation task
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Message(ClientMsg),
    Disconnected,
}

/// Connection input received from WebSocket
#[derive(Debug, Clone)]
pub struct Intent {
    pub connection_id: Uuid,
    pub event: SessionEvent,
    /// Unix ms when the transport read it; used to measure queue delay
    pub received_at: u64,
}

/// A server message and who should receive it
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Every open connection
    All(ServerMsg),
    /// A single connection
    To(Uuid, ServerMsg),
}

impl Outbound {
    pub fn msg(&self) -> &ServerMsg {
        match self {
            Outbound::All(msg) | Outbound::To(_, msg) => msg,
        }
    }
}
