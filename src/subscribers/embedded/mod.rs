//! # Built-in subscribers
//!
//! Small, self-contained implementations useful for demos and services that just
//! want hub activity in their logs.
//!
//! - [`LogWriter`]: emits every event as a `tracing` record.

mod log;

pub use log::LogWriter;
