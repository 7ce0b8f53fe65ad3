//! Hub-wide counters and their public snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared atomic counters, updated by the hub handle, registry and dispatch loop.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) published: AtomicU64,
    pub(crate) delivered: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) evicted: AtomicU64,
}

impl Counters {
    pub(crate) fn snapshot(&self, clients: usize) -> HubStats {
        HubStats {
            clients,
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of hub activity.
///
/// - `published`: messages accepted into the inbound channel
/// - `delivered`: successful per-client enqueues (one message to N clients counts N)
/// - `dropped`: per-client drops due to full queues
/// - `evicted`: clients forcibly removed (lagged or idle)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Currently registered clients.
    pub clients: usize,
    /// Messages accepted by `publish`/`try_publish`.
    pub published: u64,
    /// Per-client successful enqueues.
    pub delivered: u64,
    /// Per-client drops.
    pub dropped: u64,
    /// Forced evictions.
    pub evicted: u64,
}
