//! HTTP server setup and routing

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use mirror_common::config::ServerConfig;
use mirror_common::events::CallBus;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};
use crate::pip::PipController;
use crate::session::MirrorSession;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<MirrorSession>,
    pub pip: PipController,
    /// Fan-out of outbound calls to connected remotes
    pub bus: CallBus,
    /// Signalled each time a remote subscribes to `/events`
    pub remote_connected: Arc<Notify>,
    pub started_at: DateTime<Utc>,
}

impl AppContext {
    pub fn new(session: Arc<MirrorSession>, pip: PipController, bus: CallBus) -> Self {
        Self {
            session,
            pip,
            bus,
            remote_connected: Arc::new(Notify::new()),
            started_at: Utc::now(),
        }
    }
}

pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        // Outbound calls
        .route("/events", get(super::sse::event_stream))
        // Inbound control
        .route("/command", post(super::handlers::command))
        // Picture-in-picture
        .route("/pip/enter", post(super::handlers::pip_enter))
        .route("/pip/exit", post(super::handlers::pip_exit))
        .route("/pip/state", get(super::handlers::pip_state))
        .route("/pip/host", post(super::handlers::pip_host))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` completes
pub async fn run(
    config: &ServerConfig,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .map_err(|e| Error::Http(format!("Invalid bind address {}: {}", config.bind_addr, e)))?;

    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
