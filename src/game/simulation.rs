//! Authoritative simulation loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::util::time::{unix_millis, Timer, TICK_DURATION_MICROS};
use crate::ws::registry::ConnectionRegistry;

use super::session::SessionManager;
use super::world::SharedWorld;
use super::{Intent, Outbound};

/// Queue wait above which an intent is worth a warning
pub const QUEUE_DELAY_WARN_MS: u64 = 100;

/// Sole writer of the world.
///
/// Each tick drains every queued intent, then advances the world one step.
/// Outbound messages are dispatched once the write lock is released.
pub struct Simulation {
    world: SharedWorld,
    input_rx: mpsc::Receiver<Intent>,
    registry: Arc<ConnectionRegistry>,
}

/// Result of one tick
#[derive(Debug, Default)]
pub struct TickReport {
    pub outbound: Vec<Outbound>,
    pub intents: usize,
    /// Longest time a drained intent sat in the queue
    pub max_queue_delay_ms: u64,
    /// Every input sender is gone
    pub inputs_closed: bool,
}

impl Simulation {
    pub fn new(
        world: SharedWorld,
        input_rx: mpsc::Receiver<Intent>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            world,
            input_rx,
            registry,
        }
    }

    /// Run the tick loop until every input sender is dropped
    pub async fn run(mut self) {
        info!("Simulation started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            let timer = Timer::new();
            let report = self.tick();
            let elapsed = timer.elapsed_micros();
            if elapsed > TICK_DURATION_MICROS {
                warn!(
                    elapsed_us = elapsed,
                    intents = report.intents,
                    "Slow simulation tick"
                );
            }
            if report.max_queue_delay_ms > QUEUE_DELAY_WARN_MS {
                warn!(
                    queue_delay_ms = report.max_queue_delay_ms,
                    intents = report.intents,
                    "Intents waited too long for the simulation"
                );
            }

            self.registry.dispatch(report.outbound);

            if report.inputs_closed {
                info!("Input channel closed, stopping simulation");
                break;
            }
        }
    }

    /// Drain pending intents and step the world once. Does not dispatch.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let mut world = self.world.write();
        let now = unix_millis();

        loop {
            match self.input_rx.try_recv() {
                Ok(intent) => {
                    report.intents += 1;
                    report.max_queue_delay_ms = report
                        .max_queue_delay_ms
                        .max(now.saturating_sub(intent.received_at));
                    report
                        .outbound
                        .extend(SessionManager::apply(&mut world, intent));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    report.inputs_closed = true;
                    break;
                }
            }
        }

        report.outbound.extend(world.step());
        report
    }
}
