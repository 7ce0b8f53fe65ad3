//! # SubscriberSet: hub events to every registered [`Subscribe`].
//!
//! Each subscriber gets its own bounded queue and worker. `emit` only ever
//! `try_send`s, so a slow or panicking subscriber loses events for itself and
//! never holds up the listener or the dispatch loop that feeds it.
//!
//! ```text
//! listener ──emit(ev)──► [queue: LogWriter] ──► worker ──► on_event
//!                   ├──► [queue: metrics  ] ──► worker ──► on_event
//!                   └──► full/closed ──► SubscriberOverflow on the bus
//! ```
//!
//! A panic inside `on_event` is caught, logged and re-published as
//! `SubscriberPanicked`; the worker keeps consuming.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Slot {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out of hub events to a fixed set of subscribers.
pub struct SubscriberSet {
    slots: Vec<Slot>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber; queue capacity is at least 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (slots, workers): (Vec<Slot>, Vec<JoinHandle<()>>) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let slot = Slot {
                    name: sub.name(),
                    tx,
                };
                (slot, tokio::spawn(worker(sub, rx, bus.clone())))
            })
            .unzip();
        Self {
            slots,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the set holds no subscribers.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Hands `event` to every subscriber queue without waiting.
    ///
    /// A full or closed queue skips that subscriber and publishes
    /// `SubscriberOverflow`, except for overflow events themselves.
    pub fn emit(&self, event: Event) {
        let report = !event.is_subscriber_overflow();
        let event = Arc::new(event);

        for slot in &self.slots {
            let reason = match slot.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if report {
                self.bus.publish(Event::subscriber_overflow(slot.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to finish what they hold.
    pub async fn shutdown(self) {
        drop(self.slots);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "subscriber worker ended abnormally");
            }
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(panic_err) = handled {
            let info = panic_message(panic_err.as_ref());
            tracing::error!(subscriber = sub.name(), %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Boom;

    #[async_trait]
    impl Subscribe for Boom {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "boom"
        }
    }

    struct Tiny;

    #[async_trait]
    impl Subscribe for Tiny {
        async fn on_event(&self, _ev: &Event) {}
        fn name(&self) -> &'static str {
            "tiny"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_delivers_to_every_subscriber() {
        let bus = Bus::new(16);
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![
            a.clone() as Arc<dyn Subscribe>,
            b.clone() as Arc<dyn Subscribe>,
        ];
        let set = SubscriberSet::new(subs, bus);
        assert_eq!(set.len(), 2);

        set.emit(Event::new(EventKind::ShutdownRequested));
        set.emit(Event::new(EventKind::HubStopped));
        set.shutdown().await;

        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let ok = Arc::new(Counter::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![
            Arc::new(Boom) as Arc<dyn Subscribe>,
            ok.clone() as Arc<dyn Subscribe>,
        ];
        let set = SubscriberSet::new(subs, bus);

        set.emit(Event::new(EventKind::HubStopped));
        set.shutdown().await;

        assert_eq!(ok.0.load(Ordering::SeqCst), 1);
        let ev = rx.recv().await.expect("panic event");
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.subscriber, Some("boom"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Tiny) as Arc<dyn Subscribe>], bus);

        // Current-thread runtime: the worker has not run yet, so the second emit finds the queue full.
        set.emit(Event::new(EventKind::ShutdownRequested));
        set.emit(Event::new(EventKind::HubStopped));

        let ev = rx.try_recv().expect("overflow event");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.subscriber, Some("tiny"));
        set.shutdown().await;
    }
}
