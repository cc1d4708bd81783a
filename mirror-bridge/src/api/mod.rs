//! HTTP/SSE surface towards the remote UI runtime
//!
//! - `GET /events` streams every outbound call as a server-sent event
//! - `POST /command` accepts control calls coming back
//! - `/pip/*` drives and reports the picture-in-picture slot

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
