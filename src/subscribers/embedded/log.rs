//! # LogWriter — structured event logger
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`'s `fmt`) to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  hubcast: client joined client=client-1 clients=1
//! WARN  hubcast: message dropped client=client-1 seq=41 policy="drop_newest"
//! WARN  hubcast: client evicted client=client-1 reason="lagged" dropped=3
//! INFO  hubcast: client left client=client-2 reason="client"
//! INFO  hubcast: shutdown requested
//! INFO  hubcast: hub stopped closed=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let client = e.client.map(|c| c.to_string()).unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("unknown");

        match e.kind {
            EventKind::ClientJoined => {
                tracing::info!(target: "hubcast", %client, clients = e.clients, "client joined");
            }
            EventKind::JoinRejected => {
                tracing::warn!(target: "hubcast", clients = e.clients, "join rejected");
            }
            EventKind::ClientLeft => {
                tracing::info!(target: "hubcast", %client, reason, "client left");
            }
            EventKind::ClientEvicted => {
                tracing::warn!(target: "hubcast", %client, reason, dropped = e.dropped, "client evicted");
            }
            EventKind::MessageDropped => {
                tracing::warn!(target: "hubcast", %client, seq = e.message_seq, policy = reason, "message dropped");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "hubcast", "shutdown requested");
            }
            EventKind::HubStopped => {
                tracing::info!(target: "hubcast", closed = e.clients, "hub stopped");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "hubcast", "shutdown grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "hubcast", subscriber = e.subscriber, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "hubcast", subscriber = e.subscriber, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
