//! Published messages and client identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use bytes::Bytes;

/// Global sequence counter for published messages.
static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Global client id counter, shared by every hub in the process.
static CLIENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// A published message as seen by clients.
///
/// - `seq` is assigned by the dispatch loop, so within one hub it follows the
///   exact fan-out order. It is unique for the process lifetime.
/// - A client that lost messages to backpressure sees gaps in `seq`; that is
///   expected, not a delivery bug.
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    seq: u64,
    payload: Bytes,
}

impl Message {
    pub(crate) fn stamp(payload: Bytes) -> Self {
        Self {
            seq: MESSAGE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            payload,
        }
    }

    /// Logical publish sequence number.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Raw payload bytes.
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload as UTF-8, if it is valid UTF-8.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Consumes the message, returning the payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Opaque identifier of one registered client.
///
/// Ids are unique across every hub in the process and never reused, so an id
/// issued by one hub is always unknown to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn next() -> Self {
        Self(CLIENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}
