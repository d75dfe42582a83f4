use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;
use crate::types::StatusAck;

/// Handle WebSocket upgrade
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Stream the smoothed gaze point to one client and acknowledge its messages.
///
/// A single writer task owns the sink; the read loop hands it replies through
/// a channel so frames and acknowledgements never interleave mid-message.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<Message>(16);

    info!("New WebSocket connection established");

    let tracker = state.tracker.clone();
    let period = state.config.stream_period();
    let mut writer = tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            let message = tokio::select! {
                _ = interval.tick() => {
                    let gaze = tracker.read_state().gaze_point;
                    match serde_json::to_string(&gaze) {
                        Ok(json) => Message::Text(json.into()),
                        Err(e) => {
                            error!("Failed to serialize gaze point: {}", e);
                            continue;
                        }
                    }
                }
                reply = reply_rx.recv() => match reply {
                    Some(message) => message,
                    None => break,
                },
            };
            if let Err(e) = sender.send(message).await {
                debug!("WebSocket send failed: {}", e);
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                };

                let reply = match msg {
                    Message::Text(text) => {
                        info!("Received: {}", text.as_str());
                        match serde_json::to_string(&StatusAck::ok()) {
                            Ok(json) => Message::Text(json.into()),
                            Err(e) => {
                                error!("Failed to serialize ack: {}", e);
                                continue;
                            }
                        }
                    }
                    Message::Ping(data) => Message::Pong(data),
                    Message::Close(_) => {
                        info!("WebSocket connection closed by client");
                        break;
                    }
                    _ => continue,
                };

                if reply_tx.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(reply_tx);
    writer.abort();
    info!("WebSocket connection terminated");
}
