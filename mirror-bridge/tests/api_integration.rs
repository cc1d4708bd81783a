//! Integration tests for the mirror-bridge HTTP/SSE API
//!
//! - Health and session identity
//! - Remote control commands and their error statuses
//! - PiP endpoints and host signals
//! - SSE delivery of forwarded calls

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use helpers::RECV_TIMEOUT;
use mirror_bridge::api::{create_router, AppContext};
use mirror_bridge::engine::{EngineLoop, MediaTrack, MediaType, NativeEntity, Player, Quality};
use mirror_bridge::pip::{HeadlessHost, PipController, PipMachine, PipMessage};
use mirror_bridge::transport::{BusSink, Transport};
use mirror_bridge::MirrorSession;
use mirror_common::config::PipConfig;
use mirror_common::events::CallBus;
use mirror_common::PlayerId;

struct TestApp {
    router: axum::Router,
    player: Arc<Player>,
    session: Arc<MirrorSession>,
    engine_loop: EngineLoop,
}

fn setup() -> TestApp {
    let bus = CallBus::new(64);
    let (transport, _pump) = Transport::spawn(Uuid::new_v4(), Arc::new(BusSink::new(bus.clone())));

    let player = Arc::new(Player::new(PlayerId(1)).with_pip_capable(true));
    let (engine, engine_loop) = EngineLoop::new(player.clone());
    let session = Arc::new(MirrorSession::attach(
        player.clone(),
        engine.clone(),
        transport.clone(),
    ));

    let machine = PipMachine::new(
        Arc::new(HeadlessHost::default()),
        transport,
        PipConfig::default(),
    );
    let (pip, _task) = PipController::spawn(machine);
    pip.post(PipMessage::PlayerAdded {
        player: PlayerId(1),
        engine,
        pip_capable: true,
    })
    .unwrap();

    TestApp {
        router: create_router(AppContext::new(session.clone(), pip, bus)),
        player,
        session,
        engine_loop,
    }
}

/// Helper function to make HTTP requests to the test router
async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => {
            request = request.header("content-type", "application/json");
            request.body(Body::from(json_body.to_string())).unwrap()
        }
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_reports_session() {
    let app = setup();

    let (status, body) = make_request(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mirror-bridge");
    assert_eq!(body["sessionId"], app.session.session_id().to_string());
    assert_eq!(body["playerId"], 1);
    assert_eq!(body["attached"], true);
    assert_eq!(body["remotes"], 0);
}

#[tokio::test]
async fn test_command_resolves_uids() {
    let mut app = setup();
    let track = Arc::new(
        MediaTrack::new(MediaType::Audio, "a1", "English", "en")
            .with_qualities(vec![Quality::new("q", "AAC", 128_000)]),
    );
    app.player.audio_tracks().add(track.clone());
    let uid = app.session.registry().uid_of(track.native_id()).unwrap();

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/command",
        Some(json!({ "method": "setEnabled", "trackUid": uid.0, "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "accepted": true }));
    app.engine_loop.drain();
    assert!(track.is_enabled());

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/command",
        Some(json!({ "method": "setEnabled", "trackUid": 9999, "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["accepted"], false);
    assert!(body["reason"].as_str().unwrap().contains("9999"));

    let (status, _) = make_request(
        &app.router,
        Method::POST,
        "/command",
        Some(json!({ "method": "setMode", "trackUid": uid.0, "mode": "showing" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(
        &app.router,
        Method::POST,
        "/command",
        Some(json!({ "method": "selfDestruct" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_pip_endpoints() {
    let app = setup();

    let (status, body) = make_request(&app.router, Method::GET, "/pip/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "state": "idle", "activePlayer": null }));

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/command",
        Some(json!({ "method": "enterPip", "playerId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);

    // Unknown player: a normal refusal, not an error
    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/pip/enter",
        Some(json!({ "playerId": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entered"], false);
    assert_eq!(body["state"], "active");
    assert_eq!(body["activePlayer"], 1);

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/pip/exit",
        Some(json!({ "playerId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
}

#[tokio::test]
async fn test_pip_host_signals() {
    let mut app = setup();

    // Only player 1 is eligible, so leaving the app enters PiP
    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/pip/host",
        Some(json!({ "signal": "userLeaveHint" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "state": "active", "activePlayer": 1 }));

    let (status, _) = make_request(
        &app.router,
        Method::POST,
        "/pip/host",
        Some(json!({ "signal": "action", "code": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.engine_loop.drain(), 1);
    assert!(!app.player.is_paused());

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/pip/host",
        Some(json!({ "signal": "configurationChanged", "inPip": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "state": "idle", "activePlayer": null }));

    let (status, _) = make_request(
        &app.router,
        Method::POST,
        "/pip/host",
        Some(json!({ "signal": "shake" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_events_stream_forwarded_calls() {
    let app = setup();

    let request = Request::builder()
        .uri("/events")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    let mut body = response.into_body();

    app.player
        .video_tracks()
        .add(Arc::new(MediaTrack::new(MediaType::Video, "v1", "Main", "")));

    let frame = tokio::time::timeout(RECV_TIMEOUT, body.frame())
        .await
        .expect("timed out waiting for an event")
        .expect("stream ended")
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: onAddTrack"), "{}", text);
    assert!(text.contains(r#""kind":"video""#), "{}", text);
    assert!(text.contains(&app.session.session_id().to_string()), "{}", text);
}
