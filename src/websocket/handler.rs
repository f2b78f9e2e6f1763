//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::{ConnectionHub, OUTBOUND_QUEUE_CAPACITY};
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.ws_hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE_CAPACITY);

    let connection_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected WebSocket connection");
            let error_msg = ServerMessage::Error {
                message: e.to_string(),
            };
            let _ = sender.send(Message::Text(error_msg.to_json())).await;
            let _ = sender.close().await;
            return;
        }
    };

    let connected_msg = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    if sender
        .send(Message::Text(connected_msg.to_json()))
        .await
        .is_err()
    {
        tracing::debug!(connection_id = %connection_id, "Failed to send connected message");
        hub.unregister(&connection_id).await;
        return;
    }

    // Forward queued messages to the socket
    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.to_json())).await.is_err() {
                tracing::debug!(connection_id = %send_id, "WebSocket send failed, closing");
                break;
            }
        }
    });

    let recv_hub = Arc::clone(&hub);
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&recv_hub, &recv_id, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %recv_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &ConnectionHub, connection_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_client_message(hub, connection_id, client_msg).await,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Invalid client message");
                    ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    }
                }
            };
            let _ = hub.send_to(connection_id, reply).await;
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        // axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Apply a parsed client message and build the reply
async fn handle_client_message(
    hub: &ConnectionHub,
    connection_id: &str,
    message: ClientMessage,
) -> ServerMessage {
    let result = match message {
        ClientMessage::Subscribe { topics } => hub
            .subscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Subscribed { topics }),
        ClientMessage::Unsubscribe { topics } => hub
            .unsubscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Unsubscribed { topics }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(connection_id = %connection_id, error = %e, "Client message failed");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}
