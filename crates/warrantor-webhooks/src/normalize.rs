// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattens the registry's drifting payload shapes into one set of fields.

use serde_json::{Map, Value};

use crate::event::WebhookEventType;
use crate::path::first_present;

/// Output field and the source paths tried for it, highest priority first.
pub static FIELDS: &[(&str, &[&str])] = &[
    ("eventType", &["eventType", "event", "type", "action"]),
    ("taskId", &["taskId", "task.id"]),
    ("contactId", &["contactId", "contact.id", "clientId"]),
    ("status", &["status", "newStatus", "task.status", "state"]),
    (
        "purchaseDate",
        &[
            "purchaseDate",
            "task.customFields.purchaseDate",
            "customFields.purchaseDate",
        ],
    ),
    (
        "activationDate",
        &[
            "activationDate",
            "task.customFields.activationDate",
            "customFields.activationDate",
        ],
    ),
    (
        "expirationDate",
        &[
            "expirationDate",
            "task.customFields.expirationDate",
            "customFields.expirationDate",
        ],
    ),
    (
        "warrantyNumber",
        &["warrantyNumber", "task.customFields.warrantyNumber"],
    ),
    (
        "serialNumber",
        &["serialNumber", "task.customFields.serialNumber"],
    ),
    ("qrCode", &["qrCode", "task.customFields.qrCode", "qr"]),
];

/// Builds the flat payload. Every field in [`FIELDS`] is present, `null`
/// when no source path had a value.
pub fn normalize(event_type: WebhookEventType, body: &Value) -> Map<String, Value> {
    let mut payload: Map<String, Value> = FIELDS
        .iter()
        .map(|(field, paths)| {
            let value = first_present(body, paths).cloned().unwrap_or(Value::Null);
            ((*field).to_string(), value)
        })
        .collect();
    payload.insert(
        "internalEventType".into(),
        Value::from(event_type.as_ref()),
    );
    payload.insert("rawData".into(), body.clone());
    payload
}
