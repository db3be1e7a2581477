// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic event type detection.
//!
//! Rules are evaluated in table order and the first match wins. Keyword
//! rules look at the explicit type field; structural rules only look at
//! which identifiers are present. Nothing here can fail: a body that no
//! rule matches is `Unknown`.

use serde_json::Value;

use crate::event::WebhookEventType;
use crate::path::{first_present, is_present, lookup};

/// Fields that may carry an explicit event name, in lookup order.
pub const TYPE_FIELDS: &[&str] = &["eventType", "event", "type", "action", "changeType"];

/// What the rules get to look at.
pub struct BodyView<'a> {
    /// Explicit type field, lower-cased. Empty when absent.
    pub kind: String,
    pub body: &'a Value,
}

impl<'a> BodyView<'a> {
    pub fn new(body: &'a Value) -> Self {
        let kind = TYPE_FIELDS
            .iter()
            .filter_map(|f| body.get(*f))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_default();
        Self { kind, body }
    }

    fn kind_has(&self, needle: &str) -> bool {
        self.kind.contains(needle)
    }

    fn kind_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.kind_has(n))
    }

    fn has(&self, path: &str) -> bool {
        lookup(self.body, path).is_some_and(is_present)
    }

    fn has_any(&self, paths: &[&str]) -> bool {
        first_present(self.body, paths).is_some()
    }
}

/// One row of the classification table.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&BodyView<'_>) -> bool,
    pub event_type: WebhookEventType,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "keyword:warranty+create",
        matches: |p| p.kind_has("warranty") && p.kind_has("create"),
        event_type: WebhookEventType::WarrantyCreated,
    },
    Rule {
        name: "keyword:warranty+status",
        matches: |p| p.kind_has("warranty") && p.kind_has_any(&["status", "update"]),
        event_type: WebhookEventType::WarrantyStatusChanged,
    },
    Rule {
        name: "keyword:contact",
        matches: |p| p.kind_has_any(&["contact", "client", "buyer", "installer", "seller"]),
        event_type: WebhookEventType::ContactUpdated,
    },
    Rule {
        name: "keyword:reminder",
        matches: |p| p.kind_has_any(&["reminder", "timer", "deadline"]),
        event_type: WebhookEventType::ReminderTriggered,
    },
    Rule {
        name: "shape:task+status",
        matches: |p| {
            p.has_any(&["taskId", "task"]) && p.has_any(&["status", "newStatus", "task.status"])
        },
        event_type: WebhookEventType::WarrantyStatusChanged,
    },
    Rule {
        name: "shape:task",
        matches: |p| p.has_any(&["taskId", "task"]),
        event_type: WebhookEventType::WarrantyCreated,
    },
    Rule {
        name: "shape:contact",
        matches: |p| p.has("contactId") || p.has("contact"),
        event_type: WebhookEventType::ContactUpdated,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub event_type: WebhookEventType,
    /// Name of the rule that matched, `None` for `Unknown`.
    pub rule: Option<&'static str>,
}

pub fn classify(body: &Value) -> Classification {
    classify_with(RULES, body)
}

pub fn classify_with(rules: &[Rule], body: &Value) -> Classification {
    if !body.is_object() {
        return Classification {
            event_type: WebhookEventType::Unknown,
            rule: None,
        };
    }

    let view = BodyView::new(body);
    rules
        .iter()
        .find(|rule| (rule.matches)(&view))
        .map(|rule| Classification {
            event_type: rule.event_type,
            rule: Some(rule.name),
        })
        .unwrap_or(Classification {
            event_type: WebhookEventType::Unknown,
            rule: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn kind(body: Value) -> WebhookEventType {
        classify(&body).event_type
    }

    #[test]
    fn explicit_type_keywords() {
        assert_eq!(
            kind(json!({"eventType": "Warranty_Created"})),
            WebhookEventType::WarrantyCreated
        );
        assert_eq!(
            kind(json!({"eventType": "warranty_status_update", "taskId": "T1", "status": "active"})),
            WebhookEventType::WarrantyStatusChanged
        );
        assert_eq!(
            kind(json!({"action": "warranty.update"})),
            WebhookEventType::WarrantyStatusChanged
        );
        assert_eq!(
            kind(json!({"type": "client.changed"})),
            WebhookEventType::ContactUpdated
        );
        assert_eq!(
            kind(json!({"changeType": "DEADLINE"})),
            WebhookEventType::ReminderTriggered
        );
    }

    #[test]
    fn create_wins_over_status_when_both_appear() {
        let c = classify(&json!({"event": "warranty_create_status"}));
        assert_eq!(c.event_type, WebhookEventType::WarrantyCreated);
        assert_eq!(c.rule, Some("keyword:warranty+create"));
    }

    #[test]
    fn first_non_empty_type_field_is_used() {
        assert_eq!(
            kind(json!({"eventType": "", "event": "reminder"})),
            WebhookEventType::ReminderTriggered
        );
    }

    #[test]
    fn structural_fallbacks() {
        assert_eq!(
            kind(json!({"taskId": 7, "newStatus": "expired"})),
            WebhookEventType::WarrantyStatusChanged
        );
        assert_eq!(
            kind(json!({"task": {"id": 7, "status": "active"}})),
            WebhookEventType::WarrantyStatusChanged
        );
        assert_eq!(kind(json!({"taskId": 7})), WebhookEventType::WarrantyCreated);
        assert_eq!(
            kind(json!({"contact": {"id": 3}})),
            WebhookEventType::ContactUpdated
        );
    }

    #[test]
    fn unmatched_bodies_are_unknown() {
        assert_eq!(kind(json!({})), WebhookEventType::Unknown);
        assert_eq!(kind(json!({"eventType": "ping"})), WebhookEventType::Unknown);
        assert_eq!(kind(json!([1, 2])), WebhookEventType::Unknown);
        assert_eq!(kind(json!(null)), WebhookEventType::Unknown);
        assert_eq!(classify(&json!({})).rule, None);
    }

    #[test]
    fn custom_tables_are_honoured() {
        let rules = [Rule {
            name: "always",
            matches: |_| true,
            event_type: WebhookEventType::ReminderTriggered,
        }];
        assert_eq!(
            classify_with(&rules, &json!({})).event_type,
            WebhookEventType::ReminderTriggered
        );
    }

    proptest! {
        #[test]
        fn arbitrary_type_strings_never_panic(s in ".*") {
            let _ = classify(&json!({"eventType": s}));
        }
    }
}
