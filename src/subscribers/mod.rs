//! # Event subscribers for hub observability.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Hub / dispatch loop ── publish(Event) ──► Bus ──► subscriber listener
//!                                                        │
//!                                                        ▼
//!                                                  SubscriberSet::emit
//!                                                ┌───────┼─────────┐
//!                                                ▼       ▼         ▼
//!                                           LogWriter  Metrics   Custom
//! ```
//!
//! Subscribers see **hub events** (joins, leaves, drops, evictions, shutdown),
//! not the client messages themselves.

mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
mod embedded;

pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
