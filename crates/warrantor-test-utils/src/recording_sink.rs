// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sink that records pushes for assertion in tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use warrantor_core::NotificationSink;

/// One captured push.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StatusChanged { warranty_id: String, status: String },
    Updated { warranty_id: String, payload: Value },
}

impl Notification {
    pub fn warranty_id(&self) -> &str {
        match self {
            Self::StatusChanged { warranty_id, .. } | Self::Updated { warranty_id, .. } => {
                warranty_id
            }
        }
    }
}

/// Captures every push in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pushed: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.pushed.lock().await.clone()
    }

    /// `(warranty_id, status)` of every status push, in order.
    pub async fn status_changes(&self) -> Vec<(String, String)> {
        self.pushed
            .lock()
            .await
            .iter()
            .filter_map(|n| match n {
                Notification::StatusChanged {
                    warranty_id,
                    status,
                } => Some((warranty_id.clone(), status.clone())),
                Notification::Updated { .. } => None,
            })
            .collect()
    }

    pub async fn updates_for(&self, warranty_id: &str) -> Vec<Value> {
        self.pushed
            .lock()
            .await
            .iter()
            .filter_map(|n| match n {
                Notification::Updated {
                    warranty_id: id,
                    payload,
                } if id == warranty_id => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear(&self) {
        self.pushed.lock().await.clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify_status_changed(&self, warranty_id: &str, status: &str) {
        self.pushed.lock().await.push(Notification::StatusChanged {
            warranty_id: warranty_id.to_string(),
            status: status.to_string(),
        });
    }

    async fn notify_updated(&self, warranty_id: &str, payload: Value) {
        self.pushed.lock().await.push(Notification::Updated {
            warranty_id: warranty_id.to_string(),
            payload,
        });
    }
}
