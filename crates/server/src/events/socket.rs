//! `GET /socket` live channel.
//!
//! The channel is push-only: inbound frames are read only to notice the
//! client going away.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use super::LiveEvent;
use crate::state::AppState;

/// Upgrade to a WebSocket and stream every live event to it.
pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let events = state.events().subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(socket: WebSocket, mut events: broadcast::Receiver<LiveEvent>) {
    let listener_id = Uuid::new_v4();
    tracing::info!(%listener_id, "Live listener connected");

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(%listener_id, error = %e, "Failed to encode live event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%listener_id, skipped, "Live listener lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::info!(%listener_id, "Live listener disconnected");
}
