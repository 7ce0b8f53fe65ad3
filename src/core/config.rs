//! # Hub configuration.
//!
//! Provides [`HubConfig`] centralized settings for one [`Hub`](crate::Hub) instance.
//!
//! ## Sentinel values
//! - `max_clients = 0` → unlimited
//! - `idle_timeout = 0s` → idle eviction disabled
//! - `lag.max_drops = 0` → lag eviction disabled
//! - `grace = 0s` → `shutdown` does not wait for the dispatch loop

use std::time::Duration;

use crate::policies::{LagPolicy, OverflowPolicy};

const MIN_IDLE_SWEEP: Duration = Duration::from_millis(10);
const MAX_IDLE_SWEEP: Duration = Duration::from_secs(60);

/// Configuration for a hub instance.
///
/// Defines:
/// - **Client queues**: capacity `K` and overflow strategy
/// - **Admission**: maximum number of concurrently registered clients
/// - **Inbound channel**: capacity of the publish conduit
/// - **Eviction**: lag threshold and idle timeout
/// - **Shutdown**: grace period for draining
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Capacity `K` of each client's outbound queue (min 1; clamped).
    pub client_capacity: usize,

    /// Maximum number of registered clients.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = `join` fails with `ResourceExhausted` once `n` clients are registered
    pub max_clients: usize,

    /// Capacity of the inbound publish channel (min 1; clamped).
    ///
    /// When full, `publish` suspends and `try_publish` returns `InboundFull`.
    pub inbound_capacity: usize,

    /// What to drop when a client queue is full.
    pub overflow: OverflowPolicy,

    /// When to give up on a client that keeps dropping messages.
    pub lag: LagPolicy,

    /// How long undelivered messages may sit unread before the client is evicted.
    ///
    /// - `Duration::ZERO` = disabled
    ///
    /// Required for transports that cannot reliably report disconnects.
    pub idle_timeout: Duration,

    /// Maximum time `shutdown` waits for the dispatch loop to drain and exit.
    pub grace: Duration,

    /// Capacity of the observability event bus ring buffer (min 1; clamped by Bus).
    pub bus_capacity: usize,
}

impl HubConfig {
    /// Returns the client limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` registered clients
    #[inline]
    pub fn client_limit(&self) -> Option<usize> {
        if self.max_clients == 0 {
            None
        } else {
            Some(self.max_clients)
        }
    }

    /// Returns the idle timeout as an `Option`.
    #[inline]
    pub fn idle_limit(&self) -> Option<Duration> {
        if self.idle_timeout == Duration::ZERO {
            None
        } else {
            Some(self.idle_timeout)
        }
    }

    /// How often the dispatch loop sweeps for idle clients: half the timeout,
    /// kept within 10ms..=60s.
    #[inline]
    pub fn idle_sweep_interval(&self) -> Option<Duration> {
        self.idle_limit()
            .map(|t| (t / 2).clamp(MIN_IDLE_SWEEP, MAX_IDLE_SWEEP))
    }

    /// Returns the client queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn client_capacity_clamped(&self) -> usize {
        self.client_capacity.max(1)
    }

    /// Returns the inbound channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbound_capacity_clamped(&self) -> usize {
        self.inbound_capacity.max(1)
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `client_capacity = 64`
    /// - `max_clients = 0` (unlimited)
    /// - `inbound_capacity = 1024`
    /// - `overflow = OverflowPolicy::DropNewest`
    /// - `lag = LagPolicy::default()` (256 drops / 10s)
    /// - `idle_timeout = 0s` (disabled)
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            client_capacity: 64,
            max_clients: 0,
            inbound_capacity: 1024,
            overflow: OverflowPolicy::default(),
            lag: LagPolicy::default(),
            idle_timeout: Duration::ZERO,
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
        }
    }
}
