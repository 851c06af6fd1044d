//! Error types for display and settings queries.
//!
//! None of these cross the public query surface: every query resolves them
//! locally into a sentinel, an empty snapshot or a default. They do surface
//! from the lifecycle hooks and from the backend traits.

use thiserror::Error;

/// Result type alias for deskprops operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while talking to the platform.
#[derive(Debug, Error)]
pub enum Error {
    /// No live connection to the display server.
    #[error("display connection unavailable")]
    ConnectionUnavailable,

    /// The extension or query is not available on this host.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A platform call failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// Memory could not be reserved for a snapshot.
    #[error("out of resources: {0}")]
    OutOfResources(String),

    /// The backend answered with a value that cannot be reported.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The change listener is already running.
    #[error("listener is already running")]
    AlreadyRunning,

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),
}
