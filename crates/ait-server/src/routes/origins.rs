use crate::state::AppState;
use ait::coordinator::OriginId;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use bytes::Bytes;
use futures::Stream;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// Server-sent events, one `data:` line per envelope
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

async fn messages_handler(
    State(state): State<AppState>,
    Path(origin): Path<String>,
    body: String,
) -> StatusCode {
    // Invalid payloads are dropped by the coordinator; the page never learns
    // about them from this side.
    state.coordinator.receive(&OriginId::new(origin), &body);
    StatusCode::ACCEPTED
}

async fn events_handler(State(state): State<AppState>, Path(origin): Path<String>) -> SseResponse {
    let origin = OriginId::new(origin);
    let (session, mut envelopes) = state.coordinator.open(origin.clone());
    let coordinator = state.coordinator.clone();

    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tokio::spawn(async move {
        if tx.send(": connected\n\n".to_string()).await.is_err() {
            coordinator.disconnect_session(&origin, session);
            return;
        }

        loop {
            tokio::select! {
                envelope = envelopes.recv() => {
                    // The session was replaced by a newer connection.
                    let Some(envelope) = envelope else { break };
                    match envelope.encode() {
                        Ok(json) => {
                            if tx.send(format!("data: {}\n\n", json)).await.is_err() {
                                coordinator.disconnect_session(&origin, session);
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(%origin, error = %e, "skipping invalid outbound envelope"),
                    }
                }
                _ = tx.closed() => {
                    coordinator.disconnect_session(&origin, session);
                    break;
                }
            }
        }
    });

    SseResponse::new(stream)
}

async fn disconnect_handler(
    State(state): State<AppState>,
    Path(origin): Path<String>,
) -> StatusCode {
    state.coordinator.disconnect(&OriginId::new(origin));
    StatusCode::NO_CONTENT
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/origins/:origin/messages", post(messages_handler))
        .route("/origins/:origin/events", get(events_handler))
        .route("/origins/:origin", delete(disconnect_handler))
        .with_state(state)
}
