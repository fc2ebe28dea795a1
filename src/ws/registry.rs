//! Registry of open connections and their outbound queues

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::Outbound;
use crate::ws::protocol::ServerMsg;

/// Messages buffered per connection before new ones are dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Fan-out target for the simulation and broadcaster.
///
/// Sends never wait: a full queue drops the message for that connection
/// only, so a slow client cannot stall either loop.
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, mpsc::Sender<ServerMsg>>,
    capacity: usize,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            capacity,
        }
    }

    /// Open an outbound queue for a connection
    pub fn register(&self, id: Uuid) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.connections.insert(id, tx);
        rx
    }

    pub fn unregister(&self, id: Uuid) {
        self.connections.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue a message for one connection. Returns false if it was dropped.
    pub fn send_to(&self, id: Uuid, msg: ServerMsg) -> bool {
        match self.connections.get(&id) {
            Some(tx) => Self::try_deliver(id, &tx, msg),
            None => {
                debug!(connection_id = %id, "Send to unknown connection dropped");
                false
            }
        }
    }

    /// Queue a message for every connection
    pub fn broadcast(&self, msg: &ServerMsg) {
        for entry in self.connections.iter() {
            Self::try_deliver(*entry.key(), entry.value(), msg.clone());
        }
    }

    /// Deliver simulation output in the order it was produced
    pub fn dispatch(&self, outbound: Vec<Outbound>) {
        for item in outbound {
            match item {
                Outbound::All(msg) => self.broadcast(&msg),
                Outbound::To(id, msg) => {
                    self.send_to(id, msg);
                }
            }
        }
    }

    fn try_deliver(id: Uuid, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) -> bool {
        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection_id = %id, "Client lagging, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection_id = %id, "Outbound queue closed");
                false
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
