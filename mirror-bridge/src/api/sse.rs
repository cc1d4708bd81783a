//! Server-Sent Events stream of outbound calls

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use super::server::AppContext;

/// GET /events - one SSE event per call envelope, named after the method
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = ctx.bus.subscribe();
    ctx.remote_connected.notify_one();
    info!(
        "Remote connected to session {}, {} remote(s) total",
        ctx.session.session_id(),
        ctx.bus.subscriber_count()
    );

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(envelope) => match Event::default()
                .event(envelope.method())
                .id(envelope.seq.to_string())
                .json_data(&envelope)
            {
                Ok(event) => {
                    debug!("SSE #{} {}", envelope.seq, envelope.method());
                    Some(Ok(event))
                }
                Err(e) => {
                    warn!("Failed to serialize {}: {}", envelope.method(), e);
                    None
                }
            },
            Err(e) => {
                // Lagged: the remote missed calls; the ads snapshots and the
                // next adds let it resynchronize
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
