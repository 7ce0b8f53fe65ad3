//! # ClientHandle: the collaborator's side of a registration.
//!
//! A [`ClientHandle`] is returned by [`Hub::join`](crate::Hub::join). It owns the
//! read end of the client's bounded queue and knows how to deregister itself.
//!
//! ## Lifecycle
//! ```text
//! Registered ──► (receiving) ──► Closing ──► Closed
//!                                  ▲
//!        leave() / drop / evicted (lagged, idle) / hub shutdown
//! ```
//! There is no way back from `Closed`; a reconnecting client calls `join` again.
//!
//! ## Example
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), hubcast::HubError> {
//! use hubcast::{Hub, HubConfig};
//!
//! let hub = Hub::new(HubConfig::default());
//! let mut client = hub.join()?;
//!
//! hub.publish("hello").await?;
//! let msg = client.recv().await.expect("open");
//! assert_eq!(msg.as_str(), Some("hello"));
//!
//! client.leave(); // or just drop it
//! hub.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use futures::Stream;

use super::message::{ClientId, Message};
use super::queue::{ClientQueue, TryRecvError};
use crate::core::Registry;
use crate::error::LeaveReason;

/// Per-connection registration token plus the read end of its outbound queue.
///
/// Dropping the handle deregisters the client (same as [`leave`](Self::leave)).
pub struct ClientHandle {
    queue: Arc<ClientQueue>,
    registry: Weak<Registry>,
}

impl ClientHandle {
    pub(crate) fn new(queue: Arc<ClientQueue>, registry: Weak<Registry>) -> Self {
        Self { queue, registry }
    }

    /// Id of this client within its hub.
    #[inline]
    pub fn id(&self) -> ClientId {
        self.queue.id()
    }

    /// Capacity `K` of the outbound queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once the client is closed and, for a hub shutdown, all
    /// buffered messages were read. Use [`close_reason`](Self::close_reason) to
    /// learn why.
    pub async fn recv(&mut self) -> Option<Message> {
        self.queue.recv().await
    }

    /// Takes the next buffered message without waiting.
    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.queue.try_recv()
    }

    /// Number of messages this client lost to backpressure so far.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    /// Number of messages currently buffered.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Why the client was closed; `None` while still registered.
    ///
    /// A forced reason (`Lagged`, `Idle`) means the collaborator should tear down
    /// the underlying transport connection.
    pub fn close_reason(&self) -> Option<LeaveReason> {
        self.queue.close_reason()
    }

    /// Deregisters the client. Idempotent; also done on drop.
    pub fn leave(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.leave(self.id(), LeaveReason::Client);
        }
    }

    /// Converts the handle into a [`Stream`] of messages, ending at close.
    ///
    /// The client stays registered for as long as the stream is alive.
    pub fn into_stream(self) -> impl Stream<Item = Message> + Send + 'static {
        futures::stream::unfold(self, |mut handle| async move {
            handle.recv().await.map(|msg| (msg, handle))
        })
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.leave();
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id())
            .field("capacity", &self.capacity())
            .field("pending", &self.pending())
            .field("dropped", &self.dropped())
            .field("closed", &self.close_reason())
            .finish()
    }
}
