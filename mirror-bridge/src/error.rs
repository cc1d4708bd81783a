//! Error types for mirror-bridge
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use mirror_common::Uid;
use thiserror::Error;

/// Main error type for mirror-bridge
#[derive(Error, Debug)]
pub enum Error {
    /// UID was never assigned or has already been released
    #[error("Entity not found: uid {0}")]
    NotFound(Uid),

    /// UID resolved to an entity of the wrong kind for the operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Engine context has shut down, intents can no longer be applied
    #[error("Engine unavailable")]
    EngineUnavailable,

    /// PiP controller task is no longer running
    #[error("PiP controller stopped")]
    PipStopped,

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),
}

/// Convenience Result type using mirror-bridge Error
pub type Result<T> = std::result::Result<T, Error>;
