//! Per-client connection task.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{RelayState, CLIENT_BUFFER};

/// Register a new client and pump its socket until it goes away.
pub(crate) async fn handle_client(socket: WebSocket, state: Arc<RelayState>) {
    let client_id = Uuid::new_v4();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Utf8Bytes>(CLIENT_BUFFER);
    state.clients.insert(client_id, outbound_tx);
    info!(
        "Client connected: {} ({} connected)",
        client_id,
        state.clients.len()
    );

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                // `None` means the relay is shutting down.
                let Some(text) = outbound else { break };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    warn!("Failed to forward to {}: {}", client_id, e);
                    break;
                }
            }

            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received from {}: {}", client_id, text.as_str());
                        state.broadcast(client_id, text);
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        debug!("Received binary from {}: {}", client_id, text);
                        state.broadcast(client_id, Utf8Bytes::from(text));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Socket error from {}: {}", client_id, e);
                        break;
                    }
                }
            }
        }
    }

    let _ = ws_tx.close().await;
    state.clients.remove(&client_id);
    info!(
        "Client disconnected: {} ({} connected)",
        client_id,
        state.clients.len()
    );
}
