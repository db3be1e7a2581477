// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime notification sink trait.

use async_trait::async_trait;
use serde_json::Value;

/// Publishes ticket changes to observers subscribed to that ticket.
///
/// Publishing never fails the operation that triggered it, so neither
/// method returns a `Result`.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Pushes `warrantyStatusChanged {warrantyId, status}` to the ticket's room.
    async fn notify_status_changed(&self, warranty_id: &str, status: &str);

    /// Pushes `warrantyUpdated {warrantyId, ...payload}` to the ticket's room.
    async fn notify_updated(&self, warranty_id: &str, payload: Value);
}
