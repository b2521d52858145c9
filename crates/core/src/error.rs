//! Error types for the core library.
//!
//! The variants mirror the failure classes the chat engine distinguishes.
//! Apart from [`Error::Startup`], these are almost always logged and
//! swallowed where they occur rather than surfaced to the user.

use thiserror::Error;

/// Main error type for the core library.
#[derive(Error, Debug)]
pub enum Error {
    /// The connectivity probe itself failed; start-up cannot continue.
    #[error("startup failure: {0}")]
    Startup(String),

    /// Anonymous identity could not be obtained.
    #[error("auth failure: {0}")]
    Auth(String),

    /// The remote listener reported an error.
    #[error("sync failure: {0}")]
    Sync(String),

    /// Local snapshot could not be read, parsed or written.
    #[error("cache failure: {0}")]
    Cache(String),

    /// The remote store rejected a write.
    #[error("send failure: {0}")]
    Send(String),

    /// A device capture or blob upload failed.
    #[error("capture failure: {0}")]
    Capture(String),

    /// The user declined a device permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Embedded key-value database error
    #[error("storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
