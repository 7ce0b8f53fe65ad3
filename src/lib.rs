//! # hubcast
//!
//! **hubcast** is an in-process broadcast hub for Rust.
//!
//! It accepts one shared stream of outbound messages and fans it out to a
//! dynamically changing set of clients, each with its own bounded queue. It is
//! the hard part behind server-sent events, WebSocket broadcast or pipe fan-out;
//! the transport itself stays with the caller.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   publisher(s)                      connection handlers (one per client)
//!        │ publish(payload)                 │ join()           ▲ recv()
//!        ▼                                  ▼                  │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Hub (cheap Clone handle)                                         │
//! │  - inbound mpsc (bounded, FIFO, one total order)                  │
//! │  - Registry (ClientId → ClientQueue, closed flag, one short lock)  │
//! │  - Bus (observability events)                                     │
//! └───────┬───────────────────────────────────────────────────────────┘
//!         ▼
//!  ┌──────────────┐   snapshot()   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!  │  Dispatcher  │──────────────► │ queue C1  │ │ queue C2  │ │ queue CN  │
//!  │ (one task)   │  push() never  │ (cap K)   │ │ (cap K)   │ │ (cap K)   │
//!  └──────┬───────┘  waits         └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!         │                              ▼             ▼             ▼
//!         │                        ClientHandle  ClientHandle  ClientHandle
//!         │
//!         │ full queue ─► OverflowPolicy (DropNewest | DropOldest) ─► MessageDropped
//!         │ too many drops in window ─► leave(Lagged)               ─► ClientEvicted
//!         │ unread past idle_timeout ─► leave(Idle)                 ─► ClientEvicted
//!         ▼
//!   Bus ──► subscriber listener ──► SubscriberSet ──► LogWriter / custom Subscribe
//! ```
//!
//! ### Client lifecycle
//! ```text
//! join() ──► Registered ──► Closing ──► Closed
//!                              ▲
//!   leave(id) / handle dropped / evicted (lagged, idle) / shutdown
//! ```
//!
//! ## Guarantees
//! - Every client registered through the dispatch of message M sees M in the same
//!   relative order as every other such client.
//! - A client that joins after M was dispatched never receives M (no replay).
//! - One stalled client never blocks the publisher or other clients; it loses
//!   messages instead, visible as gaps in [`Message::seq`].
//! - `leave` is idempotent and always safe from teardown paths.
//! - `shutdown` dispatches everything already published, then closes all queues;
//!   readers drain what they had buffered before seeing end-of-stream.
//!
//! ## Features
//! | Area              | Description                                              | Key types                                 |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Hub**           | Join/leave/publish/shutdown over one dispatch loop.      | [`Hub`], [`HubBuilder`], [`ClientHandle`] |
//! | **Policies**      | Overflow strategy and lag eviction.                      | [`OverflowPolicy`], [`LagPolicy`]         |
//! | **Configuration** | Centralize hub settings.                                 | [`HubConfig`]                             |
//! | **Errors**        | Typed errors and leave reasons.                          | [`HubError`], [`LeaveReason`]             |
//! | **Observability** | Events, subscribers, counters.                           | [`Event`], [`Subscribe`], [`HubStats`]    |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (`tracing` records).
//!
//! ## Example
//! ```rust
//! use hubcast::{Hub, HubConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), hubcast::HubError> {
//!     let hub = Hub::new(HubConfig::default());
//!
//!     // A connection handler would do this per client and forward to its transport.
//!     let mut client = hub.join()?;
//!     let forward = tokio::spawn(async move {
//!         let mut out = Vec::new();
//!         while let Some(msg) = client.recv().await {
//!             out.push(format!("data: {}\n\n", msg.as_str().unwrap_or_default()));
//!         }
//!         out
//!     });
//!
//!     hub.publish("hello").await?;
//!     hub.publish("world").await?;
//!     hub.shutdown().await?;
//!
//!     let frames = forward.await.expect("forwarder");
//!     assert_eq!(frames, vec!["data: hello\n\n", "data: world\n\n"]);
//!     Ok(())
//! }
//! ```

mod clients;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use clients::{ClientHandle, ClientId, Message, TryRecvError};
pub use crate::core::{Hub, HubBuilder, HubConfig, HubStats};
pub use error::{HubError, LeaveReason};
pub use events::{Bus, Event, EventKind};
pub use policies::{LagPolicy, OverflowPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
