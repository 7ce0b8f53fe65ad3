//! # Hub: join/leave/publish/shutdown over a single dispatch loop.
//!
//! The [`Hub`] is an explicitly constructed, cheaply cloneable handle. Pass clones
//! to whatever needs it (connection handlers, ingestion endpoints, timers); there is
//! no global instance, and several independent hubs can live in one process.
//!
//! ## High-level architecture
//! ```text
//! Ingestion (HTTP POST, timer, CLI)          Connection handlers (SSE, WS, pipe)
//!        │                                          │
//!   publish(payload)                          join() ──► ClientHandle
//!        │                                          │          │
//!        ▼                                          ▼          │ recv()
//!   [inbound mpsc, bounded] ──► Dispatcher ──► [queue C1] ◄────┘
//!                                   │      ──► [queue C2]
//!                                   │      ──► [queue CN]
//!                                   ▼
//!                         Bus (observability events) ──► SubscriberSet
//!
//! Shutdown path:
//!   shutdown()
//!     └─► registry.mark_closed()          (join/publish now fail with HubClosed)
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► token.cancel()                  (dispatcher drains inbound, closes queues)
//!     └─► wait for dispatcher up to cfg.grace
//!            ├─ Ok        → Ok(())
//!            └─ timed out → Bus.publish(GraceExceeded), Err(GraceExceeded)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use hubcast::{Hub, HubConfig, OverflowPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), hubcast::HubError> {
//!     let cfg = HubConfig {
//!         client_capacity: 16,
//!         overflow: OverflowPolicy::DropOldest,
//!         grace: Duration::from_secs(1),
//!         ..HubConfig::default()
//!     };
//!     let hub = Hub::new(cfg);
//!
//!     let mut a = hub.join()?;
//!     let mut b = hub.join()?;
//!
//!     hub.publish("tick 1").await?;
//!     hub.publish("tick 2").await?;
//!     hub.shutdown().await?;
//!
//!     for client in [&mut a, &mut b] {
//!         assert_eq!(client.recv().await.unwrap().as_str(), Some("tick 1"));
//!         assert_eq!(client.recv().await.unwrap().as_str(), Some("tick 2"));
//!         assert!(client.recv().await.is_none());
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clients::{ClientHandle, ClientId};
use crate::core::{
    HubBuilder, HubConfig, Registry, shutdown,
    stats::{Counters, HubStats},
};
use crate::error::{HubError, LeaveReason};
use crate::events::{Bus, Event, EventKind};

pub(crate) struct HubInner {
    pub(crate) cfg: HubConfig,
    pub(crate) tx: mpsc::Sender<Bytes>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) bus: Bus,
    pub(crate) counters: Arc<Counters>,
    pub(crate) token: CancellationToken,
    pub(crate) dispatcher: Mutex<Option<JoinHandle<()>>>,
}

/// Broadcast hub: fans every published message out to all registered clients.
///
/// All methods are safe to call concurrently from any number of tasks/threads.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Returns a builder for configuring subscribers before starting the hub.
    pub fn builder(cfg: HubConfig) -> HubBuilder {
        HubBuilder::new(cfg)
    }

    /// Creates and starts a hub with no event subscribers.
    ///
    /// Must be called from within a tokio runtime (the dispatch loop is spawned).
    pub fn new(cfg: HubConfig) -> Self {
        HubBuilder::new(cfg).build()
    }

    pub(crate) fn from_inner(inner: HubInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Registers a new client and returns its handle.
    ///
    /// The client receives every message dispatched after this call returns; there
    /// is no replay of earlier messages.
    ///
    /// ### Errors
    /// - [`HubError::ResourceExhausted`] when `max_clients` is reached
    /// - [`HubError::HubClosed`] after shutdown
    pub fn join(&self) -> Result<ClientHandle, HubError> {
        self.inner.registry.join()
    }

    /// Deregisters a client and closes its queue, waking a blocked reader.
    ///
    /// Idempotent: returns `false` if the id was already gone, never existed, or
    /// belongs to another hub.
    pub fn leave(&self, id: ClientId) -> bool {
        self.inner.registry.leave(id, LeaveReason::Client)
    }

    /// Appends a message to the inbound channel.
    ///
    /// Returns once the message is queued for dispatch, not after fan-out.
    /// Suspends only while the inbound channel is full.
    ///
    /// ### Errors
    /// - [`HubError::HubClosed`] after shutdown
    pub async fn publish(&self, payload: impl Into<Bytes>) -> Result<(), HubError> {
        if self.inner.registry.is_closed() {
            return Err(HubError::HubClosed);
        }
        self.inner
            .tx
            .send(payload.into())
            .await
            .map_err(|_| HubError::HubClosed)?;
        self.inner.counters.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Appends a message without waiting.
    ///
    /// ### Errors
    /// - [`HubError::InboundFull`] when the inbound channel is at capacity
    /// - [`HubError::HubClosed`] after shutdown
    pub fn try_publish(&self, payload: impl Into<Bytes>) -> Result<(), HubError> {
        if self.inner.registry.is_closed() {
            return Err(HubError::HubClosed);
        }
        self.inner
            .tx
            .try_send(payload.into())
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => HubError::InboundFull,
                mpsc::error::TrySendError::Closed(_) => HubError::HubClosed,
            })?;
        self.inner.counters.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stops the hub.
    ///
    /// Everything published before this call is still dispatched; then every
    /// client queue is closed (buffered messages stay readable) and later
    /// `join`/`publish` calls fail with [`HubError::HubClosed`].
    ///
    /// Waits up to `cfg.grace` for the dispatch loop to finish (`0s` = don't wait).
    /// Safe to call more than once; only the first call waits.
    ///
    /// ### Errors
    /// - [`HubError::GraceExceeded`] if the dispatch loop did not finish in time
    pub async fn shutdown(&self) -> Result<(), HubError> {
        if self.inner.registry.mark_closed() {
            tracing::info!("hub shutdown requested");
            self.inner
                .bus
                .publish(Event::new(EventKind::ShutdownRequested));
        }
        self.inner.token.cancel();

        let Some(handle) = self.inner.dispatcher.lock().take() else {
            return Ok(());
        };
        let grace = self.inner.cfg.grace;
        if grace.is_zero() {
            return Ok(());
        }

        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "dispatch loop terminated abnormally");
                self.inner.registry.close_all();
                Ok(())
            }
            Err(_) => {
                tracing::warn!(?grace, "dispatch loop exceeded shutdown grace");
                self.inner
                    .bus
                    .publish(Event::new(EventKind::GraceExceeded));
                Err(HubError::GraceExceeded { grace })
            }
        }
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C on non-unix), then shuts down.
    ///
    /// Intended for binaries that host the hub for the process lifetime.
    pub async fn run_until_signal(&self) -> Result<(), HubError> {
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            tracing::warn!(error = %e, "signal registration failed, shutting down");
        }
        self.shutdown().await
    }

    /// Number of currently registered clients.
    pub fn client_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// True once shutdown started.
    pub fn is_closed(&self) -> bool {
        self.inner.registry.is_closed()
    }

    /// Point-in-time activity counters.
    pub fn stats(&self) -> HubStats {
        self.inner.counters.snapshot(self.client_count())
    }

    /// The configuration this hub was built with.
    pub fn config(&self) -> &HubConfig {
        &self.inner.cfg
    }

    /// Subscribes directly to the hub's observability events.
    ///
    /// Prefer [`Subscribe`](crate::Subscribe) implementations registered through
    /// the builder; this raw receiver is handy for tests and ad-hoc tooling.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("clients", &self.client_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// A hub whose dispatch loop never finishes.
    fn stalled_hub(grace: Duration) -> Hub {
        let bus = Bus::new(16);
        let counters = Arc::new(Counters::default());
        let registry = Registry::new(4, None, bus.clone(), Arc::clone(&counters));
        let (tx, rx) = mpsc::channel(4);
        let dispatcher = tokio::spawn(async move {
            let _rx = rx;
            std::future::pending::<()>().await
        });

        Hub::from_inner(HubInner {
            cfg: HubConfig {
                grace,
                ..HubConfig::default()
            },
            tx,
            registry,
            bus,
            counters,
            token: CancellationToken::new(),
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reports_grace_exceeded() {
        let grace = Duration::from_millis(50);
        let hub = stalled_hub(grace);
        let mut events = hub.events();
        hub.publish("backlog").await.expect("publish");

        assert_eq!(hub.shutdown().await, Err(HubError::GraceExceeded { grace }));
        assert!(hub.is_closed());

        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::ShutdownRequested, EventKind::GraceExceeded]
        );

        // The wait happens once; later calls return at once.
        assert_eq!(hub.shutdown().await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_grace_does_not_wait() {
        let hub = stalled_hub(Duration::ZERO);
        assert_eq!(hub.shutdown().await, Ok(()));
        assert!(hub.is_closed());
    }
}
