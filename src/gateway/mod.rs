//! Built-in WebSocket gateway. Each socket is turned into connect, message
//! and disconnect signals for the handlers; deliveries for the socket arrive
//! through its entry in the session table.

pub mod events;
pub mod heartbeat;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use events::{action, ClientFrame, ServerFrame};
use heartbeat::{HEARTBEAT_INTERVAL, HEARTBEAT_TIMEOUT};

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub user_id: Option<String>,
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
) -> Response {
    let domain = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
        .to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id, domain))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Option<String>, domain: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let connection_id = Uuid::new_v4().to_string();

    // Open the outbound channel first so a broadcast racing the register
    // call never sees this connection as gone.
    let mut rx = state.sessions.open(&connection_id);

    if let Err(e) = state
        .lifecycle
        .on_connect(Some(&connection_id), user_id.as_deref())
        .await
    {
        tracing::warn!(connection_id = %connection_id, "rejecting connection: {:?}", e);
        state.sessions.close(&connection_id);
        let _ = ws_sink
            .send(Message::Text(ServerFrame::error("connection rejected").to_json().into()))
            .await;
        let _ = ws_sink.send(Message::Close(None)).await;
        return;
    }

    run_session(&mut ws_sink, &mut ws_stream, &mut rx, &state, &connection_id, &domain).await;

    state.sessions.close(&connection_id);
    state.lifecycle.on_disconnect(&connection_id).await;
}

async fn run_session(
    ws_sink: &mut SplitSink<WebSocket, Message>,
    ws_stream: &mut SplitStream<WebSocket>,
    rx: &mut mpsc::Receiver<String>,
    state: &AppState,
    connection_id: &str,
    domain: &str,
) {
    let hello = ServerFrame::Hello {
        connection_id: connection_id.to_string(),
        heartbeat_interval: HEARTBEAT_INTERVAL.as_millis() as u64,
    };
    if ws_sink
        .send(Message::Text(hello.to_json().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut last_seen = tokio::time::Instant::now();
    let mut heartbeat_interval = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            // Deliveries from broadcasts
            Some(payload) = rx.recv() => {
                if ws_sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            _ = heartbeat_interval.tick() => {
                if last_seen.elapsed() > HEARTBEAT_TIMEOUT {
                    tracing::info!(connection_id = %connection_id, "session timed out");
                    break;
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = tokio::time::Instant::now();
                        if let Some(reply) = handle_frame(state, connection_id, domain, text.as_str()).await {
                            if ws_sink.send(Message::Text(reply.to_json().into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, "socket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        last_seen = tokio::time::Instant::now();
                    }
                }
            }
        }
    }
}

/// Route one text frame by its `action`. Returns a frame to send back to the
/// sender, if any.
async fn handle_frame(
    state: &AppState,
    connection_id: &str,
    domain: &str,
    text: &str,
) -> Option<ServerFrame> {
    let Ok(frame) = serde_json::from_str::<ClientFrame>(text) else {
        return Some(ServerFrame::error("invalid message format"));
    };

    match frame.action.as_deref() {
        Some(action::HEARTBEAT) => Some(ServerFrame::HeartbeatAck),
        Some(action::MESSAGE) => {
            match state
                .intake
                .on_message(connection_id, domain, &state.stage, text)
                .await
            {
                Ok(_) => None,
                Err(AppError::Validation(msg)) => Some(ServerFrame::error(msg)),
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, "broadcast failed: {:?}", e);
                    Some(ServerFrame::error("message could not be delivered"))
                }
            }
        }
        Some(other) => Some(ServerFrame::error(format!("unknown action: {other}"))),
        None => Some(ServerFrame::error("missing action")),
    }
}
