//! Chat data model and local message flow.
//!
//! - Message, session and remote record types
//! - The shared newest-first timeline
//! - Local snapshot cache over a durable key-value store
//! - Outbound pipeline (optimistic prepend, remote write, snapshot save)

pub mod outbound;
pub mod store;
pub mod timeline;
pub mod types;

pub use outbound::OutboundPipeline;
pub use store::{KeyValueStore, LocalCache, SledKeyValueStore};
pub use timeline::TimelineHandle;
pub use types::*;
