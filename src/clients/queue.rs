//! # Bounded single-producer/single-consumer client queue.
//!
//! [`ClientQueue`] is the outbound buffer of one client. The dispatch loop is its
//! only writer, the collaborator's forwarding task its only reader.
//!
//! ## Rules
//! - **Non-blocking push**: `push` never waits; a full queue applies the
//!   [`OverflowPolicy`] and reports a drop.
//! - **Closed writes are no-ops**: pushing into a closed queue returns
//!   [`Push::Closed`] and stores nothing.
//! - **Close is idempotent**: only the first close wins and records its reason.
//! - **Suspending pop**: `recv` waits on a [`Notify`] until data or close arrives.
//!
//! ```text
//! dispatch loop ──push()──► [ VecDeque (cap K) ] ──recv()──► forwarding task
//!                  │                                    ▲
//!                  └── full: DropNewest / DropOldest     └── Notify (one permit)
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::message::{ClientId, Message};
use crate::error::LeaveReason;
use crate::policies::{LagPolicy, LagWindow, OverflowPolicy};

/// Outcome of a single non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Push {
    /// Message buffered.
    Enqueued,
    /// Queue was full; `lost_seq` is the message that did not make it
    /// (the incoming one for drop-newest, the evicted head for drop-oldest).
    /// `lagged` is set once the lag policy threshold is reached.
    Dropped { lost_seq: u64, lagged: bool },
    /// Queue already closed; nothing stored.
    Closed,
}

/// Non-blocking receive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    /// Nothing buffered right now.
    #[error("client queue empty")]
    Empty,
    /// Queue closed and fully drained.
    #[error("client queue closed ({})", .0.as_label())]
    Closed(LeaveReason),
}

struct QueueState {
    buf: VecDeque<Message>,
    closed: Option<LeaveReason>,
    dropped: u64,
    lag: LagWindow,
    /// Start of the current unread stretch (reset on push-into-empty and on every take).
    waiting_since: Instant,
}

pub(crate) struct ClientQueue {
    id: ClientId,
    capacity: usize,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl ClientQueue {
    pub(crate) fn new(id: ClientId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            capacity,
            state: Mutex::new(QueueState {
                buf: VecDeque::with_capacity(capacity),
                closed: None,
                dropped: 0,
                lag: LagWindow::default(),
                waiting_since: Instant::now(),
            }),
            notify: Notify::new(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ClientId {
        self.id
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tries to enqueue `msg` without waiting.
    pub(crate) fn push(
        &self,
        msg: Message,
        overflow: OverflowPolicy,
        lag: &LagPolicy,
        now: Instant,
    ) -> Push {
        let outcome = {
            let mut st = self.state.lock();
            if st.closed.is_some() {
                return Push::Closed;
            }

            if st.buf.len() < self.capacity {
                if st.buf.is_empty() {
                    st.waiting_since = now;
                }
                st.buf.push_back(msg);
                Push::Enqueued
            } else {
                let lost_seq = match overflow {
                    OverflowPolicy::DropNewest => msg.seq(),
                    OverflowPolicy::DropOldest => {
                        let head = st.buf.pop_front().map(|m| m.seq()).unwrap_or(msg.seq());
                        st.buf.push_back(msg);
                        head
                    }
                };
                st.dropped += 1;
                let lagged = st.lag.record(lag, now);
                Push::Dropped { lost_seq, lagged }
            }
        };

        if outcome == Push::Enqueued {
            self.notify.notify_one();
        }
        outcome
    }

    /// Closes the queue with `reason`. Returns `false` if it was already closed.
    ///
    /// With `discard`, buffered messages are dropped so the reader sees
    /// end-of-stream right away; without it the reader drains them first.
    pub(crate) fn close(&self, reason: LeaveReason, discard: bool) -> bool {
        {
            let mut st = self.state.lock();
            if st.closed.is_some() {
                return false;
            }
            st.closed = Some(reason);
            if discard {
                st.buf.clear();
            }
        }
        self.notify.notify_one();
        true
    }

    /// Takes the head message without waiting.
    pub(crate) fn try_recv(&self) -> Result<Message, TryRecvError> {
        let mut st = self.state.lock();
        match st.buf.pop_front() {
            Some(msg) => {
                st.waiting_since = Instant::now();
                Ok(msg)
            }
            None => match st.closed {
                Some(reason) => Err(TryRecvError::Closed(reason)),
                None => Err(TryRecvError::Empty),
            },
        }
    }

    /// Waits for the next message; `None` once the queue is closed and drained.
    pub(crate) async fn recv(&self) -> Option<Message> {
        loop {
            match self.try_recv() {
                Ok(msg) => return Some(msg),
                Err(TryRecvError::Closed(_)) => return None,
                Err(TryRecvError::Empty) => self.notify.notified().await,
            }
        }
    }

    /// True if messages have waited unread for at least `timeout`.
    pub(crate) fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        let st = self.state.lock();
        st.closed.is_none()
            && !st.buf.is_empty()
            && now.saturating_duration_since(st.waiting_since) >= timeout
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().buf.len()
    }

    pub(crate) fn close_reason(&self) -> Option<LeaveReason> {
        self.state.lock().closed
    }
}
