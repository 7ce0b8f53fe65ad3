//! # Runtime events emitted by the hub.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Client events**: registration lifecycle (joined, left, evicted, rejected, dropped message)
//! - **Hub events**: shutdown lifecycle (requested, stopped, grace exceeded)
//! - **Subscriber events**: observability pipeline health (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, client id,
//! reasons and message sequence numbers.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use hubcast::{Event, EventKind, Hub, HubConfig, LeaveReason};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = Hub::new(HubConfig::default());
//! let client = hub.join().expect("join");
//!
//! let ev = Event::client_evicted(client.id(), LeaveReason::Lagged, 12);
//!
//! assert_eq!(ev.kind, EventKind::ClientEvicted);
//! assert_eq!(ev.client, Some(client.id()));
//! assert_eq!(ev.reason.as_deref(), Some("lagged"));
//! assert_eq!(ev.dropped, Some(12));
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::clients::ClientId;
use crate::error::LeaveReason;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of hub events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Client events ===
    /// A client registered.
    ///
    /// Sets:
    /// - `client`: new client id
    /// - `clients`: registry size after insert
    ClientJoined,

    /// A client was rejected by admission (`ResourceExhausted`).
    ///
    /// Sets:
    /// - `clients`: registry size at rejection
    JoinRejected,

    /// A client left on its own (explicit `leave` or dropped handle).
    ///
    /// Sets:
    /// - `client`: client id
    /// - `reason`: `"client"`
    /// - `dropped`: total drops the client accumulated
    ClientLeft,

    /// A client was forcibly removed by the hub.
    ///
    /// Sets:
    /// - `client`: client id
    /// - `reason`: `"lagged"` or `"idle"`
    /// - `dropped`: total drops the client accumulated
    ClientEvicted,

    /// A message was dropped for one client (its queue was full).
    ///
    /// Sets:
    /// - `client`: client id
    /// - `message_seq`: sequence of the lost message
    /// - `reason`: overflow policy label
    MessageDropped,

    // === Hub events ===
    /// Shutdown requested (explicit call or OS signal).
    ShutdownRequested,

    /// Dispatch loop drained the inbound channel, closed all queues and exited.
    ///
    /// Sets:
    /// - `clients`: number of queues closed at stop
    HubStopped,

    /// Dispatch loop did not exit within the configured grace period.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: panic info/message
    /// - `subscriber`: subscriber name
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Hub event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Client the event is about, if applicable.
    pub client: Option<ClientId>,
    /// Human-readable reason (leave reason, overflow details, panic info).
    pub reason: Option<Arc<str>>,
    /// Sequence number of the message involved, if applicable.
    pub message_seq: Option<u64>,
    /// Per-client drop count, if applicable.
    pub dropped: Option<u64>,
    /// Registry size, if applicable.
    pub clients: Option<usize>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            client: None,
            reason: None,
            message_seq: None,
            dropped: None,
            clients: None,
            subscriber: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a client id.
    #[inline]
    pub fn with_client(mut self, id: ClientId) -> Self {
        self.client = Some(id);
        self
    }

    /// Attaches a message sequence number.
    #[inline]
    pub fn with_message_seq(mut self, seq: u64) -> Self {
        self.message_seq = Some(seq);
        self
    }

    /// Attaches a drop count.
    #[inline]
    pub fn with_dropped(mut self, n: u64) -> Self {
        self.dropped = Some(n);
        self
    }

    /// Attaches the registry size.
    #[inline]
    pub fn with_clients(mut self, n: usize) -> Self {
        self.clients = Some(n);
        self
    }

    /// Creates a client-joined event.
    #[inline]
    pub fn client_joined(id: ClientId, clients: usize) -> Self {
        Event::new(EventKind::ClientJoined)
            .with_client(id)
            .with_clients(clients)
    }

    /// Creates a client-left (`reason = Client`) or client-evicted (forced reason) event.
    #[inline]
    pub fn client_evicted(id: ClientId, reason: LeaveReason, dropped: u64) -> Self {
        let kind = if reason.is_forced() {
            EventKind::ClientEvicted
        } else {
            EventKind::ClientLeft
        };
        Event::new(kind)
            .with_client(id)
            .with_reason(reason.as_label())
            .with_dropped(dropped)
    }

    /// Creates a message-dropped event.
    #[inline]
    pub fn message_dropped(id: ClientId, message_seq: u64, policy: &'static str) -> Self {
        Event::new(EventKind::MessageDropped)
            .with_client(id)
            .with_message_seq(message_seq)
            .with_reason(policy)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// True for events reporting a subscriber that could not keep up.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True for events reporting a panic inside a subscriber.
    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ShutdownRequested);
        let b = Event::new(EventKind::HubStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_client_left_vs_evicted() {
        let id = ClientId::from_raw(1);
        assert_eq!(
            Event::client_evicted(id, LeaveReason::Client, 0).kind,
            EventKind::ClientLeft
        );
        assert_eq!(
            Event::client_evicted(id, LeaveReason::Shutdown, 0).kind,
            EventKind::ClientLeft
        );
        let idle = Event::client_evicted(id, LeaveReason::Idle, 3);
        assert_eq!(idle.kind, EventKind::ClientEvicted);
        assert_eq!(idle.reason.as_deref(), Some("idle"));
    }

    #[test]
    fn test_subscriber_events() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.subscriber, Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));

        let ev = Event::subscriber_panicked("audit", "boom".into());
        assert!(ev.is_subscriber_panic());
    }
}
