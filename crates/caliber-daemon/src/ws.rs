//! WebSocket handler for real-time updates

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use caliber_core::MovementSnapshot;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::{AppState, MovementEvent};

/// WebSocket message types
#[derive(Serialize)]
#[serde(tag = "type", content = "data")]
enum WsMessage {
    #[serde(rename = "frame")]
    Frame {
        fps: f32,
        #[serde(flatten)]
        snapshot: MovementSnapshot,
    },
    #[serde(rename = "highlight")]
    Highlight { part: Option<String> },
    #[serde(rename = "pong")]
    Pong,
}

impl From<MovementEvent> for WsMessage {
    fn from(event: MovementEvent) -> Self {
        match event {
            MovementEvent::Frame { fps, snapshot } => WsMessage::Frame { fps, snapshot },
            MovementEvent::Highlight(part) => WsMessage::Highlight { part },
        }
    }
}

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.subscribe();

    info!("WebSocket client connected");

    // Send current highlight on connect
    let highlighted = state.assembly.read().await.highlighted().map(str::to_string);
    if let Ok(json) = serde_json::to_string(&WsMessage::Highlight { part: highlighted }) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&WsMessage::from(event)) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Slow clients drop frames rather than the connection
                        debug!(skipped = n, "Frame channel lagged");
                    }
                    Err(e) => {
                        debug!(error = %e, "Frame channel error");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        if text.as_str() == "ping" {
                            let Ok(pong) = serde_json::to_string(&WsMessage::Pong) else {
                                continue;
                            };
                            if sender.send(Message::Text(pong.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}
