//! Error types used by the hub.
//!
//! This module defines:
//!
//! - [`HubError`] — errors returned by hub operations (`join`, `publish`, `shutdown`).
//! - [`LeaveReason`] — why a client left the registry (not an error, but carried
//!   alongside closed handles and `ClientLeft`/`ClientEvicted` events).
//!
//! Both types provide `as_label` for logs/metrics.
//!
//! Backpressure drops are intentionally **not** errors: the publish path never fails
//! because one client lags behind.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by hub operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The configured maximum client count is reached; reject the new connection.
    #[error("client limit of {max} reached")]
    ResourceExhausted {
        /// The configured maximum.
        max: usize,
    },

    /// The hub has been shut down.
    #[error("hub is closed")]
    HubClosed,

    /// Inbound channel is at capacity (only from [`try_publish`](crate::Hub::try_publish)).
    #[error("inbound channel full")]
    InboundFull,

    /// The dispatch loop did not finish draining within the shutdown grace period.
    #[error("shutdown grace {grace:?} exceeded")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl HubError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use hubcast::HubError;
    ///
    /// let err = HubError::ResourceExhausted { max: 10 };
    /// assert_eq!(err.as_label(), "hub_resource_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HubError::ResourceExhausted { .. } => "hub_resource_exhausted",
            HubError::HubClosed => "hub_closed",
            HubError::InboundFull => "hub_inbound_full",
            HubError::GraceExceeded { .. } => "hub_grace_exceeded",
        }
    }

    /// Indicates whether the caller may retry later.
    ///
    /// Only [`HubError::InboundFull`] is transient; a full registry needs an
    /// explicit decision from the caller and a closed hub never reopens.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HubError::InboundFull)
    }
}

/// Why a client was removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaveReason {
    /// The collaborator called `leave` (or dropped the handle).
    Client,
    /// Too many drops within the lag window; forcibly evicted.
    Lagged,
    /// Undelivered messages sat unread longer than the idle timeout.
    Idle,
    /// The hub shut down.
    Shutdown,
}

impl LeaveReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LeaveReason::Client => "client",
            LeaveReason::Lagged => "lagged",
            LeaveReason::Idle => "idle",
            LeaveReason::Shutdown => "shutdown",
        }
    }

    /// True for removals decided by the hub rather than the connection owner.
    pub fn is_forced(&self) -> bool {
        matches!(self, LeaveReason::Lagged | LeaveReason::Idle)
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
