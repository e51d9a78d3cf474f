use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_events::{EVENT_SYSTEM_STATUS, broadcast_system_status},
    state::SharedState,
};

/// Receivers backing one public SSE connection.
pub struct PublicSubscription {
    events: broadcast::Receiver<ServerEvent>,
    ticks: broadcast::Receiver<ServerEvent>,
    round_id: Option<Uuid>,
}

/// Subscribe to the shared public SSE stream, optionally narrowed to one round.
pub fn subscribe_public(state: &SharedState, round_id: Option<Uuid>) -> PublicSubscription {
    let hub = state.public_sse();
    PublicSubscription {
        events: hub.subscribe(),
        ticks: hub.subscribe_ticks(),
        round_id,
    }
}

/// First event sent on a fresh connection, before anything broadcast.
pub fn handshake(state: &SharedState) -> Option<ServerEvent> {
    ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            stream: "public".into(),
            message: "public stream connected".into(),
            degraded: state.is_degraded(),
        },
    )
    .ok()
}

/// Convert a subscription into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    subscription: PublicSubscription,
    greeting: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    tokio::spawn(forward(subscription, greeting, tx));

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx).map(|payload| Ok::<_, Infallible>(to_event(payload)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Read both hub channels and push matching events into `tx` until either side closes.
async fn forward(
    subscription: PublicSubscription,
    greeting: Option<ServerEvent>,
    tx: mpsc::Sender<ServerEvent>,
) {
    let PublicSubscription {
        mut events,
        mut ticks,
        round_id,
    } = subscription;
    let mut ticking = true;

    if let Some(greeting) = greeting {
        if tx.send(greeting).await.is_err() {
            return;
        }
    }

    loop {
        let payload = tokio::select! {
            biased;
            _ = tx.closed() => break,
            recv_result = events.recv() => match recv_result {
                Ok(payload) => payload,
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "public SSE subscriber lagged on round events");
                    continue;
                }
            },
            recv_result = ticks.recv(), if ticking => match recv_result {
                Ok(payload) => payload,
                Err(RecvError::Closed) => {
                    ticking = false;
                    continue;
                }
                Err(RecvError::Lagged(skipped)) => {
                    // A slow client just misses a few countdown refreshes.
                    debug!(skipped, "public SSE subscriber lagged on ticks");
                    continue;
                }
            },
        };

        if !payload.visible_to(round_id) {
            continue;
        }
        if tx.send(payload).await.is_err() {
            break;
        }
    }

    info!("Public SSE stream disconnected");
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Forward degraded-mode changes to the public stream for the lifetime of the process.
pub async fn relay_system_status(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        info!(degraded, event = EVENT_SYSTEM_STATUS, "storage status changed");
        broadcast_system_status(&state, degraded);
    }
}
