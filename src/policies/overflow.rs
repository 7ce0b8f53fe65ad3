//! # Overflow policy for full client queues.
//!
//! [`OverflowPolicy`] decides what the dispatch loop does when a client's bounded
//! queue has no room for the next message. Either way the enqueue is **non-blocking**
//! and the event is counted as a drop for that client only.
//!
//! - [`OverflowPolicy::DropNewest`] — reject the incoming message (default).
//! - [`OverflowPolicy::DropOldest`] — evict the oldest buffered message, keep the new one.

/// Policy controlling which message is lost when a client queue is full.
///
/// ## Trade-offs
/// - **DropNewest**: a briefly stalled client resumes with a contiguous run of
///   already-buffered history; the newest messages are the ones it misses.
/// - **DropOldest**: the client always holds the freshest `K` messages; good for
///   "latest state" feeds where stale entries are worthless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Reject the incoming message for the lagging client.
    #[default]
    DropNewest,

    /// Evict the oldest queued message to make room for the incoming one.
    DropOldest,
}

impl OverflowPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::DropNewest => "drop_newest",
            OverflowPolicy::DropOldest => "drop_oldest",
        }
    }
}
