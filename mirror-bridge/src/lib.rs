//! # Media Mirror Bridge Library (mirror-bridge)
//!
//! Mirrors a native media player's observable state into a remote UI runtime.
//!
//! **Purpose:** Assign stable UIDs to engine entities, forward their
//! add/remove/change events as protocol calls, resolve remote control calls
//! back onto the engine thread, and arbitrate the picture-in-picture slot.
//!
//! **Architecture:** Engine sources → forwarders → transport pump → CallBus →
//! SSE clients; commands come back through the HTTP API.

pub mod api;
pub mod binding;
pub mod engine;
pub mod error;
pub mod forwarder;
mod lock;
pub mod pip;
pub mod registry;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use session::MirrorSession;
