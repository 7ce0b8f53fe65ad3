//! # Lag policy: forced eviction of clients that cannot keep up.
//!
//! [`LagPolicy`] bounds how many drops a client may accumulate inside a sliding
//! time window before the hub gives up on it and evicts it with
//! [`LeaveReason::Lagged`](crate::LeaveReason::Lagged).
//!
//! [`LagWindow`] is the per-client bookkeeping: it remembers the instants of
//! recent drops and forgets those older than the window.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use hubcast::LagPolicy;
//!
//! let lag = LagPolicy { max_drops: 3, window: Duration::from_secs(1) };
//! assert!(lag.is_enabled());
//!
//! let off = LagPolicy::disabled();
//! assert!(!off.is_enabled());
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Eviction threshold for lagging clients.
///
/// ## Field semantics
/// - `max_drops`: drops within `window` that trigger eviction (`0` = never evict)
/// - `window`: sliding window length (`0s` = drops never expire)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LagPolicy {
    /// Number of drops within the window that triggers eviction.
    pub max_drops: u32,
    /// Length of the sliding window.
    pub window: Duration,
}

impl LagPolicy {
    /// A policy that never evicts.
    pub const fn disabled() -> Self {
        Self {
            max_drops: 0,
            window: Duration::ZERO,
        }
    }

    /// Returns `true` if eviction on lag is active.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.max_drops > 0
    }
}

impl Default for LagPolicy {
    /// `max_drops = 256`, `window = 10s`.
    fn default() -> Self {
        Self {
            max_drops: 256,
            window: Duration::from_secs(10),
        }
    }
}

/// Sliding record of drop instants for one client.
#[derive(Debug, Default)]
pub(crate) struct LagWindow {
    drops: VecDeque<Instant>,
}

impl LagWindow {
    /// Records a drop at `now`; returns `true` once the policy threshold is reached.
    pub(crate) fn record(&mut self, policy: &LagPolicy, now: Instant) -> bool {
        if !policy.is_enabled() {
            return false;
        }
        if !policy.window.is_zero() {
            while let Some(&oldest) = self.drops.front() {
                if now.duration_since(oldest) >= policy.window {
                    self.drops.pop_front();
                } else {
                    break;
                }
            }
        }
        self.drops.push_back(now);
        self.drops.len() >= policy.max_drops as usize
    }

    /// Number of drops currently inside the window.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.drops.len()
    }
}
