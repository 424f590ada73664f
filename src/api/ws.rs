//! WebSocket feed of store changes.
//!
//! Every connection starts with a `state_sync` snapshot, then receives each
//! [`StoreEvent`] as it is broadcast. A client that falls behind the
//! broadcast buffer gets a fresh snapshot instead of the missed events.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::routes::ApiState;
use crate::store::{AppStore, StoreEvent};

/// Messages a client may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientAction {
    CompleteTask { task_id: String },
    Resync,
}

pub(super) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.store))
}

async fn send_event(socket: &mut WebSocket, event: &StoreEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize store event");
            true
        }
    }
}

async fn send_sync(socket: &mut WebSocket, store: &AppStore) -> bool {
    let sync = StoreEvent::StateSync {
        state: store.snapshot().await,
    };
    send_event(socket, &sync).await
}

async fn handle_socket(mut socket: WebSocket, store: Arc<AppStore>) {
    info!("WebSocket client connected");

    // Subscribe before the snapshot so nothing slips between the two.
    let mut rx = store.subscribe();

    if !send_sync(&mut socket, &store).await {
        warn!("Failed to send initial sync, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("Client disconnected during send");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind broadcast");
                        if !send_sync(&mut socket, &store).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_message(&text, &mut socket, &store).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
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

    info!("WebSocket connection closed");
}

/// Returns false once the socket is unusable.
async fn handle_client_message(text: &str, socket: &mut WebSocket, store: &AppStore) -> bool {
    match serde_json::from_str::<ClientAction>(text) {
        Ok(ClientAction::CompleteTask { task_id }) => {
            // The resulting event reaches this client through the broadcast.
            if store.complete_task(&task_id).await.is_none() {
                debug!(task_id = %task_id, "Complete via WS changed nothing");
            }
            true
        }
        Ok(ClientAction::Resync) => send_sync(socket, store).await,
        Err(e) => {
            debug!(error = %e, text = text, "Unrecognized WS message from client");
            true
        }
    }
}
