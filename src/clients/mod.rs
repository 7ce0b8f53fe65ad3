//! Client-side data structures: messages, ids, queues and handles.
//!
//! ## Contents
//! - [`Message`], [`ClientId`] what clients receive and how they are named
//! - `ClientQueue` bounded SPSC queue with non-blocking push (crate-private)
//! - [`ClientHandle`] the collaborator's registration token and reader
//! - [`TryRecvError`] non-blocking receive failures

mod handle;
mod message;
mod queue;

pub use handle::ClientHandle;
pub use message::{ClientId, Message};
pub use queue::TryRecvError;

pub(crate) use queue::{ClientQueue, Push};
