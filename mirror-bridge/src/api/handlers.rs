//! HTTP request handlers
//!
//! Control calls from the remote runtime and PiP endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use mirror_common::protocol::{CommandReply, RemoteCommand};
use mirror_common::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::server::AppContext;
use crate::error::Error;
use crate::pip::{PipMessage, PipStatus};
use crate::transport::TransportStats;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    session_id: Uuid,
    player_id: PlayerId,
    attached: bool,
    remotes: usize,
    uptime_secs: i64,
    transport: TransportStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipRequest {
    player_id: PlayerId,
}

/// Lifecycle signal reported by the host platform
#[derive(Debug, Deserialize)]
#[serde(tag = "signal", rename_all = "camelCase")]
pub enum HostSignal {
    UserLeaveHint,
    ConfigurationChanged {
        #[serde(rename = "inPip")]
        in_pip: bool,
    },
    Action {
        code: i32,
    },
}

impl From<HostSignal> for PipMessage {
    fn from(signal: HostSignal) -> Self {
        match signal {
            HostSignal::UserLeaveHint => PipMessage::UserLeaveHint,
            HostSignal::ConfigurationChanged { in_pip } => {
                PipMessage::ConfigurationChanged { in_pip }
            }
            HostSignal::Action { code } => PipMessage::Action { code },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PipEnterResponse {
    entered: bool,
    #[serde(flatten)]
    status: PipStatus,
}

type Rejection = (StatusCode, Json<CommandReply>);

/// Map a bridge error to an HTTP status with a rejected reply
fn reject(error: Error) -> Rejection {
    let status = match &error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::EngineUnavailable | Error::PipStopped => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Command rejected ({}): {}", status, error);
    (status, Json(CommandReply::rejected(error.to_string())))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mirror-bridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_id: ctx.session.session_id(),
        player_id: ctx.session.player_id(),
        attached: ctx.session.is_attached(),
        remotes: ctx.bus.subscriber_count(),
        uptime_secs: (Utc::now() - ctx.started_at).num_seconds(),
        transport: ctx.session.transport().stats(),
    })
}

// ============================================================================
// Remote control
// ============================================================================

/// POST /command - Apply a control call from the remote runtime
///
/// Track commands are resolved by the session; PiP commands go to the PiP
/// controller. A refused PiP enter is a normal reply with `accepted: false`.
pub async fn command(
    State(ctx): State<AppContext>,
    Json(command): Json<RemoteCommand>,
) -> Result<Json<CommandReply>, Rejection> {
    match command {
        RemoteCommand::EnterPip { player_id } => {
            let entered = ctx.pip.enter_pip(player_id).await.map_err(reject)?;
            Ok(Json(if entered {
                CommandReply::accepted()
            } else {
                CommandReply::rejected(format!("PiP unavailable for {}", player_id))
            }))
        }
        RemoteCommand::ExitPip { player_id } => {
            ctx.pip.exit_pip(player_id).await.map_err(reject)?;
            Ok(Json(CommandReply::accepted()))
        }
        command => ctx
            .session
            .handle_command(command)
            .map(Json)
            .map_err(reject),
    }
}

// ============================================================================
// Picture-in-picture
// ============================================================================

/// POST /pip/enter - Request the PiP slot for a player
pub async fn pip_enter(
    State(ctx): State<AppContext>,
    Json(req): Json<PipRequest>,
) -> Result<Json<PipEnterResponse>, Rejection> {
    info!("PiP enter request for {}", req.player_id);
    let entered = ctx.pip.enter_pip(req.player_id).await.map_err(reject)?;
    Ok(Json(PipEnterResponse {
        entered,
        status: ctx.pip.status(),
    }))
}

/// POST /pip/exit - Leave PiP for a player
pub async fn pip_exit(
    State(ctx): State<AppContext>,
    Json(req): Json<PipRequest>,
) -> Result<Json<PipStatus>, Rejection> {
    info!("PiP exit request for {}", req.player_id);
    ctx.pip.exit_pip(req.player_id).await.map_err(reject)?;
    Ok(Json(ctx.pip.status()))
}

/// POST /pip/host - Feed a host lifecycle signal to the PiP machine
///
/// Answers with the status after the signal was handled.
pub async fn pip_host(
    State(ctx): State<AppContext>,
    Json(signal): Json<HostSignal>,
) -> Result<Json<PipStatus>, Rejection> {
    info!("Host signal {:?}", signal);
    ctx.pip.signal(signal.into()).await.map(Json).map_err(reject)
}

/// GET /pip/state - Current PiP state and slot holder
pub async fn pip_state(State(ctx): State<AppContext>) -> Json<PipStatus> {
    Json(ctx.pip.status())
}
