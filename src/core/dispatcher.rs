//! # Dispatch loop: the single writer to every client queue.
//!
//! One [`Dispatcher`] runs per hub, spawned by the builder, for the hub's lifetime.
//!
//! ## Architecture
//! ```text
//! publish() ──► [inbound mpsc] ──► Dispatcher::run()
//!                                    │
//!                                    ├─► stamp Message{seq}
//!                                    ├─► registry.snapshot()
//!                                    └─► for each queue: push() (never waits)
//!                                          ├─ Enqueued
//!                                          ├─ Dropped ──► MessageDropped
//!                                          │     └─ lagged ──► leave(Lagged)
//!                                          └─ Closed  ──► skip (left mid-pass)
//!
//! idle sweep (optional interval) ──► leave(Idle) for stale readers
//!
//! shutdown token ──► close inbound ──► drain remaining ──► close_all() ──► HubStopped
//! ```
//!
//! ## Rules
//! - Messages are taken one at a time: one total order for every client.
//! - A push never suspends, so one stalled client cannot stall the loop.
//! - Nothing in a pass can fail: closed queues and unknown ids are no-ops.
//! - The loop also ends when every `Hub` clone is dropped (inbound closed).

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::clients::{Message, Push};
use crate::core::{HubConfig, Registry, stats::Counters};
use crate::error::LeaveReason;
use crate::events::{Bus, Event, EventKind};

pub(crate) struct Dispatcher {
    rx: mpsc::Receiver<Bytes>,
    registry: Arc<Registry>,
    cfg: HubConfig,
    bus: Bus,
    counters: Arc<Counters>,
    token: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(
        rx: mpsc::Receiver<Bytes>,
        registry: Arc<Registry>,
        cfg: HubConfig,
        bus: Bus,
        counters: Arc<Counters>,
        token: CancellationToken,
    ) -> Self {
        Self {
            rx,
            registry,
            cfg,
            bus,
            counters,
            token,
        }
    }

    /// Runs until shutdown is requested or every publisher is gone.
    pub(crate) async fn run(mut self) {
        let mut sweep = self.cfg.idle_sweep_interval().and_then(sweep_interval);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(payload) => self.dispatch(payload),
                    None => break,
                },
                _ = tick(&mut sweep) => self.sweep_idle(),
            }
        }

        self.stop().await;
    }

    /// Fans one payload out to the current registry snapshot.
    fn dispatch(&self, payload: Bytes) {
        let msg = Message::stamp(payload);
        let now = Instant::now();
        let overflow = self.cfg.overflow;

        for queue in self.registry.snapshot() {
            match queue.push(msg.clone(), overflow, &self.cfg.lag, now) {
                Push::Enqueued => {
                    self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Push::Dropped { lost_seq, lagged } => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    self.bus.publish(Event::message_dropped(
                        queue.id(),
                        lost_seq,
                        overflow.as_label(),
                    ));
                    if lagged {
                        self.registry.leave(queue.id(), LeaveReason::Lagged);
                    }
                }
                Push::Closed => {}
            }
        }
    }

    /// Evicts clients whose buffered messages went unread past the idle timeout.
    fn sweep_idle(&self) {
        let Some(timeout) = self.cfg.idle_limit() else {
            return;
        };
        let now = Instant::now();
        for queue in self.registry.snapshot() {
            if queue.is_idle(now, timeout) {
                self.registry.leave(queue.id(), LeaveReason::Idle);
            }
        }
    }

    /// Drains what was already published, then closes every remaining client.
    async fn stop(&mut self) {
        self.registry.mark_closed();
        self.rx.close();
        let mut drained = 0usize;
        while let Some(payload) = self.rx.recv().await {
            self.dispatch(payload);
            drained += 1;
        }

        let closed = self.registry.close_all();
        tracing::info!(drained, closed, "hub stopped");
        self.bus
            .publish(Event::new(EventKind::HubStopped).with_clients(closed));
    }
}

/// `None` when the first deadline is not representable; the sweep is then off.
fn sweep_interval(period: Duration) -> Option<Interval> {
    let start = Instant::now().checked_add(period)?;
    let mut interval = time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_interval_rejects_unrepresentable_period() {
        assert!(sweep_interval(Duration::MAX).is_none());
        assert!(sweep_interval(Duration::from_secs(1)).is_some());
    }
}
