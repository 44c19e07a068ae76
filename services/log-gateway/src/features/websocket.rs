use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::services::rooms::RoomRegistry;

/// Frames a viewer may send. The first frame on every connection must be a
/// join; everything after it is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientFrame {
    #[serde(rename_all = "camelCase")]
    Join { deployment_id: String },
}

pub async fn ws_logs(
    ws: WebSocketUpgrade,
    State(rooms): State<RoomRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, rooms))
}

async fn handle_socket(mut socket: WebSocket, rooms: RoomRegistry) {
    let deployment_id = loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Join { deployment_id }) => break deployment_id,
                Err(e) => {
                    warn!("Rejecting malformed join frame: {}", e);
                    return;
                }
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            _ => return,
        }
    };

    info!("👀 Viewer joined deployment {}", deployment_id);
    let mut receiver = rooms.join(&deployment_id);

    loop {
        tokio::select! {
            chunk = receiver.recv() => {
                match chunk {
                    Ok(logs) => {
                        let frame = log_update_frame(&deployment_id, &logs);
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    // A slow viewer misses chunks rather than stalling the room.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Viewer of {} lagged, {} chunks dropped", deployment_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("Viewer left deployment {}", deployment_id);
}

fn log_update_frame(deployment_id: &str, logs: &str) -> String {
    json!({
        "event": "logUpdate",
        "deploymentId": deployment_id,
        "logs": logs,
    })
    .to_string()
}
