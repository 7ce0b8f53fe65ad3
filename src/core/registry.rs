//! # Client registry.
//!
//! Owns the map of registered clients and the hub's closed flag.
//!
//! ## Rules
//! - `join` inserts, `leave`/`close_all` remove; the dispatch loop only reads snapshots
//! - the lock is held for map mutation only (plus a non-blocking queue close)
//! - a queue is closed **under the same lock** that removes it, so once an id is
//!   gone from the map its queue rejects every write
//! - `closed` lives under the same lock, so `join` racing `shutdown` either
//!   registers before `close_all` runs (and gets closed by it) or fails
//! - removal is idempotent: unknown ids are a no-op
//!
//! Lock order: registry → queue. The dispatch loop takes queue locks only.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::clients::{ClientHandle, ClientId, ClientQueue};
use crate::core::stats::Counters;
use crate::error::{HubError, LeaveReason};
use crate::events::{Bus, Event, EventKind};

struct RegistryState {
    clients: HashMap<ClientId, Arc<ClientQueue>>,
    closed: bool,
}

/// Registry of connected clients.
pub(crate) struct Registry {
    state: Mutex<RegistryState>,
    capacity: usize,
    limit: Option<usize>,
    bus: Bus,
    counters: Arc<Counters>,
}

impl Registry {
    pub(crate) fn new(
        capacity: usize,
        limit: Option<usize>,
        bus: Bus,
        counters: Arc<Counters>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RegistryState {
                clients: HashMap::new(),
                closed: false,
            }),
            capacity,
            limit,
            bus,
            counters,
        })
    }

    /// Registers a new client with a fresh queue.
    pub(crate) fn join(self: &Arc<Self>) -> Result<ClientHandle, HubError> {
        let (queue, clients) = {
            let mut st = self.state.lock();
            if st.closed {
                return Err(HubError::HubClosed);
            }
            if let Some(max) = self.limit {
                if st.clients.len() >= max {
                    let clients = st.clients.len();
                    drop(st);
                    self.bus
                        .publish(Event::new(EventKind::JoinRejected).with_clients(clients));
                    tracing::warn!(max, "client limit reached, rejecting join");
                    return Err(HubError::ResourceExhausted { max });
                }
            }

            let id = ClientId::next();
            let queue = Arc::new(ClientQueue::new(id, self.capacity));
            st.clients.insert(id, Arc::clone(&queue));
            (queue, st.clients.len())
        };

        let id = queue.id();
        tracing::debug!(%id, clients, "client joined");
        self.bus.publish(Event::client_joined(id, clients));
        Ok(ClientHandle::new(queue, Arc::downgrade(self)))
    }

    /// Removes `id` and closes its queue, discarding anything still buffered.
    ///
    /// Returns `false` if the id was not registered (already left, evicted, or unknown).
    pub(crate) fn leave(&self, id: ClientId, reason: LeaveReason) -> bool {
        let queue = {
            let mut st = self.state.lock();
            let Some(queue) = st.clients.remove(&id) else {
                return false;
            };
            queue.close(reason, true);
            queue
        };

        let dropped = queue.dropped();
        if reason.is_forced() {
            self.counters.evicted.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(%id, reason = reason.as_label(), dropped, "client evicted");
        } else {
            tracing::debug!(%id, reason = reason.as_label(), "client left");
        }
        self.bus.publish(Event::client_evicted(id, reason, dropped));
        true
    }

    /// Copies the current set of queues for one dispatch pass.
    pub(crate) fn snapshot(&self) -> Vec<Arc<ClientQueue>> {
        self.state.lock().clients.values().cloned().collect()
    }

    /// Flags the registry closed; later joins fail. Returns `true` on the first call.
    pub(crate) fn mark_closed(&self) -> bool {
        let mut st = self.state.lock();
        !std::mem::replace(&mut st.closed, true)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Closes every remaining queue with [`LeaveReason::Shutdown`], keeping buffered
    /// messages readable. Returns how many clients were closed.
    pub(crate) fn close_all(&self) -> usize {
        let drained: Vec<Arc<ClientQueue>> = {
            let mut st = self.state.lock();
            st.closed = true;
            let drained: Vec<_> = st.clients.drain().map(|(_, q)| q).collect();
            for queue in &drained {
                queue.close(LeaveReason::Shutdown, false);
            }
            drained
        };

        for queue in &drained {
            self.bus.publish(Event::client_evicted(
                queue.id(),
                LeaveReason::Shutdown,
                queue.dropped(),
            ));
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().clients.len()
    }
}
