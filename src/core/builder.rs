use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use super::{
    dispatcher::Dispatcher,
    hub::{Hub, HubInner},
    registry::Registry,
    stats::Counters,
};
use crate::{
    core::HubConfig,
    error::panic_message,
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Hub`] with optional event subscribers.
pub struct HubBuilder {
    cfg: HubConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl HubBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: HubConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive hub events (joins, leaves, drops, evictions, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the hub and starts its background tasks.
    ///
    /// This consumes the builder and initializes:
    /// - Event bus for observability
    /// - Client registry
    /// - Subscriber workers and their listener (only if subscribers were given)
    /// - The dispatch loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Hub {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let counters = Arc::new(Counters::default());
        let token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(bus.subscribe(), set);
        }

        let registry = Registry::new(
            self.cfg.client_capacity_clamped(),
            self.cfg.client_limit(),
            bus.clone(),
            Arc::clone(&counters),
        );

        let (tx, rx) = mpsc::channel(self.cfg.inbound_capacity_clamped());
        let dispatcher = Dispatcher::new(
            rx,
            Arc::clone(&registry),
            self.cfg.clone(),
            bus.clone(),
            Arc::clone(&counters),
            token.clone(),
        );
        let join = tokio::spawn(run_guarded(
            dispatcher.run(),
            Arc::clone(&registry),
            bus.clone(),
        ));

        tracing::debug!(
            client_capacity = self.cfg.client_capacity_clamped(),
            max_clients = self.cfg.max_clients,
            overflow = self.cfg.overflow.as_label(),
            "hub started"
        );

        Hub::from_inner(HubInner {
            cfg: self.cfg,
            tx,
            registry,
            bus,
            counters,
            token,
            dispatcher: Mutex::new(Some(join)),
        })
    }
}

/// Runs the dispatch loop; if it panics, the hub is still closed and every
/// client gets end-of-stream.
async fn run_guarded(run: impl Future<Output = ()>, registry: Arc<Registry>, bus: Bus) {
    if let Err(panic_err) = std::panic::AssertUnwindSafe(run).catch_unwind().await {
        let info = panic_message(panic_err.as_ref());
        tracing::error!(%info, "dispatch loop panicked, closing hub");
        registry.mark_closed();
        let closed = registry.close_all();
        bus.publish(
            Event::new(EventKind::HubStopped)
                .with_clients(closed)
                .with_reason(info),
        );
    }
}

/// Forwards bus events to the subscriber set until the hub stops.
///
/// The set is shut down (workers drained and joined) after `HubStopped` is forwarded.
fn subscriber_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let stopped = matches!(ev.kind, EventKind::HubStopped);
                    set.emit(ev);
                    if stopped {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "subscriber listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
