//! Backpressure policies.
//!
//! This module groups the knobs that control **what** a lagging client loses and
//! **when** the hub stops trying to serve it.
//!
//! ## Contents
//! - [`OverflowPolicy`] which message is dropped when a client queue is full
//! - [`LagPolicy`]      how many drops within a window trigger forced eviction
//!
//! ## Quick wiring
//! ```text
//! HubConfig { overflow: OverflowPolicy, lag: LagPolicy, idle_timeout }
//!      └─► core::dispatcher uses:
//!           - overflow when ClientQueue::push finds the queue full
//!           - lag.record(now) per drop, evicting with LeaveReason::Lagged
//! ```
//!
//! ## Defaults
//! - `OverflowPolicy::DropNewest`.
//! - `LagPolicy::default()` → 256 drops within 10s.

mod lag;
mod overflow;

pub(crate) use lag::LagWindow;
pub use lag::LagPolicy;
pub use overflow::OverflowPolicy;
