//! Hub events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to observability events emitted by the hub, its dispatch
//! loop and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Hub` (`join`/`leave`/`shutdown`), the dispatch loop
//!   (drops, evictions, stop), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `HubBuilder::build`, which
//!   fans out to user [`Subscribe`](crate::Subscribe) implementations.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
