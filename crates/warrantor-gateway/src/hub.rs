// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-ticket subscription rooms for realtime observers.
//!
//! Client -> Server (JSON):
//! ```json
//! {"event": "joinWarranty", "data": {"warrantyId": "W-1"}}
//! {"event": "leaveWarranty", "data": {"warrantyId": "W-1"}}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"event": "joinedWarranty", "data": {"warrantyId": "W-1"}}
//! {"event": "warrantyStatusChanged", "data": {"warrantyId": "W-1", "status": "draft"}}
//! {"event": "warrantyUpdated", "data": {"warrantyId": "W-1", "role": "buyer", "contactId": "C1"}}
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use warrantor_core::NotificationSink;

/// Frame names exchanged over the realtime socket.
pub mod events {
    pub const JOIN: &str = "joinWarranty";
    pub const LEAVE: &str = "leaveWarranty";
    pub const JOINED: &str = "joinedWarranty";
    pub const LEFT: &str = "leftWarranty";
    pub const ERROR: &str = "error";
    pub const STATUS_CHANGED: &str = "warrantyStatusChanged";
    pub const UPDATED: &str = "warrantyUpdated";
}

/// Frame sent by a client.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    event: String,
    #[serde(default)]
    data: Option<RoomRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRequest {
    #[serde(default)]
    warranty_id: Option<String>,
}

/// Connection registry plus `warranty_{id}` rooms.
///
/// A connection stays in a room until it leaves or disconnects. Fan-out
/// uses `try_send`, so a slow subscriber loses frames instead of stalling
/// the operation that published them.
#[derive(Debug, Default)]
pub struct RealtimeHub {
    rooms: DashMap<String, HashSet<String>>,
    connections: DashMap<String, mpsc::Sender<String>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_for(warranty_id: &str) -> String {
        format!("warranty_{warranty_id}")
    }

    /// Registers an outbound channel and returns the new connection id.
    pub fn register(&self, sender: mpsc::Sender<String>) -> String {
        let connection_id = uuid::Uuid::new_v4().to_string();
        self.connections.insert(connection_id.clone(), sender);
        info!(connection_id = %connection_id, "realtime client connected");
        connection_id
    }

    /// Drops the connection and removes it from every room.
    pub fn disconnect(&self, connection_id: &str) {
        self.connections.remove(connection_id);
        for mut room in self.rooms.iter_mut() {
            room.value_mut().remove(connection_id);
        }
        self.rooms.retain(|_, members| !members.is_empty());
        info!(connection_id, "realtime client disconnected");
    }

    /// Idempotent.
    pub fn join(&self, connection_id: &str, warranty_id: &str) {
        let room = Self::room_for(warranty_id);
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id.to_string());
        info!(connection_id, room = %room, "joined room");
    }

    /// Idempotent.
    pub fn leave(&self, connection_id: &str, warranty_id: &str) {
        let room = Self::room_for(warranty_id);
        if let Some(mut members) = self.rooms.get_mut(&room) {
            members.remove(connection_id);
        }
        self.rooms.remove_if(&room, |_, members| members.is_empty());
        info!(connection_id, room = %room, "left room");
    }

    pub fn subscriber_count(&self, warranty_id: &str) -> usize {
        self.rooms
            .get(&Self::room_for(warranty_id))
            .map_or(0, |members| members.len())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Handles one text frame from a client and returns the reply, if any.
    ///
    /// Unparseable frames and unknown events are logged and ignored.
    pub fn handle_frame(&self, connection_id: &str, text: &str) -> Option<String> {
        let frame: ClientFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(connection_id, "invalid realtime frame: {e}");
                return None;
            }
        };
        let warranty_id = frame
            .data
            .unwrap_or_default()
            .warranty_id
            .filter(|id| !id.trim().is_empty());

        match (frame.event.as_str(), warranty_id) {
            (events::JOIN, Some(id)) => {
                self.join(connection_id, &id);
                Some(frame_text(events::JOINED, json!({ "warrantyId": id })))
            }
            (events::JOIN, None) => {
                warn!(connection_id, "join without warrantyId");
                Some(frame_text(
                    events::ERROR,
                    json!({ "message": "warrantyId is required" }),
                ))
            }
            (events::LEAVE, Some(id)) => {
                self.leave(connection_id, &id);
                Some(frame_text(events::LEFT, json!({ "warrantyId": id })))
            }
            (events::LEAVE, None) => None,
            (other, _) => {
                debug!(connection_id, event = other, "ignoring unknown realtime event");
                None
            }
        }
    }

    /// Sends `frame` to every member of the ticket's room. Returns how many
    /// subscribers accepted it.
    fn publish(&self, warranty_id: &str, frame: String) -> usize {
        let room = Self::room_for(warranty_id);
        let members: Vec<String> = match self.rooms.get(&room) {
            Some(members) => members.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for member in members {
            let Some(sender) = self.connections.get(&member).map(|s| s.value().clone()) else {
                continue;
            };
            match sender.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(connection_id = %member, room = %room, "subscriber lagging, frame dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection_id = %member, room = %room, "subscriber already closed");
                }
            }
        }
        delivered
    }
}

#[async_trait]
impl NotificationSink for RealtimeHub {
    async fn notify_status_changed(&self, warranty_id: &str, status: &str) {
        let frame = frame_text(
            events::STATUS_CHANGED,
            json!({ "warrantyId": warranty_id, "status": status }),
        );
        let delivered = self.publish(warranty_id, frame);
        info!(warranty_id, status, delivered, "emitted warrantyStatusChanged");
    }

    async fn notify_updated(&self, warranty_id: &str, payload: Value) {
        let mut data = Map::new();
        data.insert("warrantyId".into(), Value::from(warranty_id));
        match payload {
            Value::Object(fields) => data.extend(fields),
            Value::Null => {}
            other => {
                data.insert("payload".into(), other);
            }
        }
        let delivered = self.publish(warranty_id, frame_text(events::UPDATED, Value::Object(data)));
        info!(warranty_id, delivered, "emitted warrantyUpdated");
    }
}

fn frame_text(event: &str, data: Value) -> String {
    json!({ "event": event, "data": data }).to_string()
}
