//! Hub core: registry, dispatch loop and lifecycle.
//!
//! The public API from this module is [`Hub`], [`HubBuilder`], [`HubConfig`] and
//! [`HubStats`].
//!
//! Internal modules:
//! - [`registry`]: client map, join/leave, closed flag;
//! - [`dispatcher`]: the single loop that fans messages out and evicts laggards;
//! - [`hub`]: the public handle (join/leave/publish/shutdown);
//! - [`builder`]: wires bus, registry, subscribers and dispatcher together;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`stats`]: shared counters.

mod builder;
mod config;
mod dispatcher;
mod hub;
mod registry;
mod shutdown;
mod stats;

pub use builder::HubBuilder;
pub use config::HubConfig;
pub use hub::Hub;
pub use stats::HubStats;

pub(crate) use registry::Registry;
