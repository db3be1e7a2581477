// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes classified events to their handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use warrantor_core::NotificationSink;

use crate::classify::classify;
use crate::event::{IngestOutcome, WebhookEvent, WebhookEventType, WebhookSource};
use crate::normalize::normalize;
use crate::path::{as_text, first_present};

/// Header names that may carry the registry's shared secret, in lookup order.
pub const SIGNATURE_HEADERS: &[&str] = &[
    "x-planfix-signature",
    "x-planfix-secret",
    "x-webhook-signature",
];

const WARRANTY_ID_FIELDS: &[&str] = &["warrantyId", "taskId", "warranty_id"];
const STATUS_FIELDS: &[&str] = &["status", "newStatus", "warrantyStatus"];

/// Accepts registry webhooks and turns status changes into realtime pushes.
#[derive(Clone)]
pub struct WebhookDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl WebhookDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Classifies, normalizes and dispatches one body.
    ///
    /// Never fails: unknown or malformed bodies are logged and acknowledged.
    /// `signature` is the first signature header found, if any; it is not
    /// verified yet.
    pub async fn ingest(&self, body: Value, signature: Option<&str>) -> IngestOutcome {
        debug!(body = %body, "registry webhook received");
        if signature.is_none_or(|s| s.trim().is_empty()) {
            warn!("registry webhook without signature header, accepting anyway");
        }

        let classification = classify(&body);
        let payload = normalize(classification.event_type, &body);
        let event = WebhookEvent {
            source: WebhookSource::Planfix,
            event_type: classification.event_type,
            payload,
            raw: body,
        };
        debug!(
            event_type = %event.event_type,
            rule = classification.rule.unwrap_or("none"),
            "webhook classified"
        );

        self.handle(&event).await;

        IngestOutcome {
            success: true,
            event_type: event.event_type,
        }
    }

    pub async fn handle(&self, event: &WebhookEvent) {
        info!(source = %event.source, event_type = %event.event_type, "handling webhook event");
        match event.event_type {
            WebhookEventType::WarrantyStatusChanged => self.on_status_changed(event).await,
            // Extension points: logged, no state is touched yet.
            WebhookEventType::WarrantyCreated
            | WebhookEventType::ContactUpdated
            | WebhookEventType::ReminderTriggered => {
                info!(
                    event_type = %event.event_type,
                    payload = %serde_json::Value::Object(event.payload.clone()),
                    "webhook event acknowledged"
                );
            }
            WebhookEventType::Unknown => {
                warn!(raw = %event.raw, "unknown webhook event type");
            }
        }
    }

    async fn on_status_changed(&self, event: &WebhookEvent) {
        let payload = Value::Object(event.payload.clone());
        let warranty_id = first_present(&payload, WARRANTY_ID_FIELDS).and_then(as_text);
        let status = first_present(&payload, STATUS_FIELDS).and_then(as_text);

        let (Some(warranty_id), Some(status)) = (warranty_id, status) else {
            warn!("status change webhook without warranty id or status, ignoring");
            return;
        };

        info!(warranty_id = %warranty_id, status = %status, "pushing warranty status change");
        self.sink.notify_status_changed(&warranty_id, &status).await;
    }
}
