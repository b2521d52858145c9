//! gochat Core Library
//!
//! Message synchronization and offline cache engine for the gochat client:
//! - Connectivity gate choosing between the live feed and the local snapshot
//! - Anonymous identity session
//! - Remote sync controller republishing the full timeline on every update
//! - Local snapshot cache
//! - Outbound pipeline and attachment capture (image, location)
//!
//! Collaborators (network probe, remote store, identity provider, blob store,
//! devices) are consumed through traits and bundled in a [`ChatContext`].

pub mod attachment;
pub mod chat;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod identity;
pub mod memory;
pub mod platform;
pub mod screen;
pub mod subscription;
pub mod sync;

// Re-export commonly used types
pub use attachment::{AttachmentAction, Attachments, CaptureOutcome, CapturedImage, FsBlobStore};
pub use chat::{
    GeoPoint, LocalCache, Message, MessageDraft, MessageId, MessageRecord, OutboundPipeline,
    Session, SledKeyValueStore, Timeline, TimelineHandle,
};
pub use config::Config;
pub use connectivity::{ConnectivityGate, Mode, TcpProbe};
pub use error::{Error, Result};
pub use identity::IdentitySession;
pub use screen::{ChatContext, ChatScreen, ScreenStatus};
pub use subscription::Subscription;
pub use sync::RemoteSync;
