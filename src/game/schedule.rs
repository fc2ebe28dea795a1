//! Deferred effects keyed by simulation time
//!
//! Respawns and reload completions are queued here and consumed by the
//! simulation step, so they never mutate the world from another context.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use uuid::Uuid;

/// Effect applied when its due time is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    Respawn { player_id: Uuid },
    ReloadComplete { player_id: Uuid },
}

#[cfg(test)]
impl DeferredEffect {
    pub fn player_id(&self) -> Uuid {
        match *self {
            Self::Respawn { player_id } | Self::ReloadComplete { player_id } => player_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due_ms: u64,
    /// Insertion order, breaks ties between equal due times
    seq: u64,
    effect: DeferredEffect,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending effects
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, effect: DeferredEffect) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { due_ms, seq, effect }));
    }

    /// Remove and return every effect due at or before `now_ms`, in due order
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<DeferredEffect> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due_ms > now_ms {
                break;
            }
            if let Some(Reverse(entry)) = self.queue.pop() {
                due.push(entry.effect);
            }
        }
        due
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued effects equal to `effect`
    #[cfg(test)]
    pub fn count(&self, effect: &DeferredEffect) -> usize {
        self.queue.iter().filter(|Reverse(s)| &s.effect == effect).count()
    }
}
