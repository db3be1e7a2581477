// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport for the realtime hub.
//!
//! The frame protocol itself lives in [`crate::hub`].

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::server::GatewayState;

/// Outbound frames buffered per connection before new ones are dropped.
const OUTBOUND_BUFFER: usize = 64;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Spawns a writer task that drains the connection's channel into the
/// socket, and reads client frames until the socket closes.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let connection_id = state.hub.register(tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                if let Some(reply) = state.hub.handle_frame(&connection_id, text.as_str())
                    && tx.send(reply).await.is_err()
                {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.hub.disconnect(&connection_id);
    sender_task.abort();
}
