// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized webhook envelope.

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Closed set of event types the dispatcher understands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookEventType {
    WarrantyCreated,
    WarrantyStatusChanged,
    ContactUpdated,
    ReminderTriggered,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookSource {
    Planfix,
}

/// One inbound event after classification and normalization.
///
/// `raw` keeps the body exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub source: WebhookSource,
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    pub payload: Map<String, Value>,
    pub raw: Value,
}

/// Reply returned to the registry for every accepted body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub success: bool,
    pub event_type: WebhookEventType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_like_the_wire_reply() {
        let out = IngestOutcome {
            success: true,
            event_type: WebhookEventType::WarrantyStatusChanged,
        };
        assert_eq!(
            serde_json::to_value(out).unwrap(),
            serde_json::json!({"success": true, "eventType": "warranty_status_changed"})
        );
    }
}
