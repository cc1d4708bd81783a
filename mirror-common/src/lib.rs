//! # Media Mirror Common Library
//!
//! Shared code for the mirror bridge and its remote clients:
//! - Wire protocol (RemoteCall / RemoteCommand and their payloads)
//! - Call envelopes and the CallBus used to fan calls out to remote UIs
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod protocol;

pub use error::{Error, Result};
pub use protocol::{PlayerId, Uid};
