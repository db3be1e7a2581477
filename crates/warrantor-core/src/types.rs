// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the registry backends, the lifecycle engine and the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Registry,
    CodeDelivery,
}

/// Lifecycle status of a warranty ticket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarrantyStatus {
    /// Created, no commitment yet.
    Draft,
    /// Seller or buyer attached, return window running.
    PendingActivation,
    /// Fully activated. Nothing regresses out of this state except an admin override.
    Active,
    /// Window elapsed without activation.
    Expired,
}

/// A person known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_code: Option<String>,
}

/// Identity fields used to find-or-create a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UpsertContact {
    /// Returns a copy with phone and email normalized and blank values dropped.
    pub fn normalized(&self) -> Self {
        Self {
            phone: self.phone.as_deref().and_then(normalize_phone),
            email: self.email.as_deref().and_then(normalize_email),
            name: self.name.as_deref().and_then(non_blank),
        }
    }
}

/// Partial update of a contact. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_code: Option<String>,
}

impl ContactPatch {
    pub fn normalized(&self) -> Self {
        Self {
            phone: self.phone.as_deref().and_then(normalize_phone),
            email: self.email.as_deref().and_then(normalize_email),
            name: self.name.as_deref().and_then(non_blank),
            seller_code: self.seller_code.as_deref().and_then(normalize_seller_code),
        }
    }

    /// Writes every supplied field onto `contact`.
    pub fn apply_to(&self, contact: &mut Contact) {
        let patch = self.normalized();
        if let Some(phone) = patch.phone {
            contact.phone = Some(phone);
        }
        if let Some(email) = patch.email {
            contact.email = Some(email);
        }
        if let Some(name) = patch.name {
            contact.name = Some(name);
        }
        if let Some(code) = patch.seller_code {
            contact.seller_code = Some(code);
        }
    }
}

impl From<UpsertContact> for ContactPatch {
    fn from(value: UpsertContact) -> Self {
        Self {
            phone: value.phone,
            email: value.email,
            name: value.name,
            seller_code: None,
        }
    }
}

/// One product's guarantee ticket, keyed by its scanned code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warranty {
    pub id: String,
    pub qr: String,
    /// Absent when the registry has not assigned a status yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WarrantyStatus>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Warranty {
    /// `true` when the ticket has no status yet or is still a draft.
    pub fn is_draft_like(&self) -> bool {
        matches!(self.status, None | Some(WarrantyStatus::Draft))
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(WarrantyStatus::Active)
    }

    pub fn is_expired(&self) -> bool {
        self.status == Some(WarrantyStatus::Expired)
    }

    pub fn contact_for(&self, role: ActorRole) -> Option<&str> {
        match role {
            ActorRole::Buyer => self.buyer_contact_id.as_deref(),
            ActorRole::Seller => self.seller_contact_id.as_deref(),
            ActorRole::Installer => self.installer_contact_id.as_deref(),
        }
    }
}

/// The role a contact plays on a warranty ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorRole {
    Buyer,
    Seller,
    Installer,
}

/// Which actor a bonus was credited to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BonusRole {
    Seller,
    Installer,
}

/// A bonus ledger entry, keyed by the idempotency id of the triggering event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusEvent {
    pub id: String,
    pub warranty_id: String,
    pub role: BonusRole,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A bonus entry before the ledger stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBonusEvent {
    pub id: String,
    pub warranty_id: String,
    pub role: BonusRole,
    pub amount: i64,
}

impl NewBonusEvent {
    pub fn stamp(self, created_at: DateTime<Utc>) -> BonusEvent {
        BonusEvent {
            id: self.id,
            warranty_id: self.warranty_id,
            role: self.role,
            amount: self.amount,
            created_at,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reduces a phone number to `+` and digits, so `+380 (50) 111-22-33` and
/// `+380501112233` are the same key. Input without digits yields `None`.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let kept: String = phone
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    kept.chars().any(|c| c.is_ascii_digit()).then_some(kept)
}

/// Trims and lower-cases an email address. Blank input yields `None`.
pub fn normalize_email(email: &str) -> Option<String> {
    non_blank(email).map(|e| e.to_lowercase())
}

pub fn normalize_seller_code(code: &str) -> Option<String> {
    non_blank(code)
}

/// Normalizes a login identifier: anything with an `@` is an email,
/// everything else a phone.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        normalize_email(trimmed)
    } else {
        normalize_phone(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn warranty(status: Option<WarrantyStatus>) -> Warranty {
        Warranty {
            id: "w1".into(),
            qr: "QR-1".into(),
            status,
            created_at: Utc::now(),
            buyer_contact_id: None,
            seller_contact_id: Some("s1".into()),
            installer_contact_id: None,
            meta: None,
        }
    }

    #[test]
    fn status_uses_snake_case_everywhere() {
        let json = serde_json::to_string(&WarrantyStatus::PendingActivation).unwrap();
        assert_eq!(json, "\"pending_activation\"");
        assert_eq!(WarrantyStatus::PendingActivation.to_string(), "pending_activation");
        assert_eq!(
            WarrantyStatus::from_str("expired").unwrap(),
            WarrantyStatus::Expired
        );
        assert!(WarrantyStatus::from_str("archived").is_err());
    }

    #[test]
    fn draft_like_covers_missing_status() {
        assert!(warranty(None).is_draft_like());
        assert!(warranty(Some(WarrantyStatus::Draft)).is_draft_like());
        assert!(!warranty(Some(WarrantyStatus::PendingActivation)).is_draft_like());
        assert!(warranty(Some(WarrantyStatus::Active)).is_active());
        assert!(warranty(Some(WarrantyStatus::Expired)).is_expired());
    }

    #[test]
    fn warranty_serializes_camel_case_and_skips_absent_links() {
        let value = serde_json::to_value(warranty(Some(WarrantyStatus::Draft))).unwrap();
        assert_eq!(value["sellerContactId"], "s1");
        assert_eq!(value["status"], "draft");
        assert!(value.get("buyerContactId").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn contact_for_role() {
        let w = warranty(None);
        assert_eq!(w.contact_for(ActorRole::Seller), Some("s1"));
        assert_eq!(w.contact_for(ActorRole::Buyer), None);
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_phone("  +380 50  "), Some("+38050".into()));
        assert_eq!(
            normalize_phone(" +380 (50) 111-22-33 "),
            normalize_phone("+380501112233")
        );
        assert_eq!(normalize_phone("n/a"), None);
        assert_eq!(normalize_email(" Ann@Example.COM "), Some("ann@example.com".into()));
        assert_eq!(normalize_email("   "), None);
        assert_eq!(normalize_seller_code(" SON-ABC123 "), Some("SON-ABC123".into()));
    }

    #[test]
    fn identifiers_split_on_at_sign() {
        assert_eq!(
            normalize_identifier(" Ann@Example.com ").as_deref(),
            Some("ann@example.com")
        );
        assert_eq!(
            normalize_identifier("+380 50 111 22 33").as_deref(),
            Some("+380501112233")
        );
        assert_eq!(normalize_identifier("   "), None);
        assert_eq!(normalize_identifier("no digits"), None);
    }

    #[test]
    fn patch_only_overwrites_supplied_fields() {
        let mut contact = Contact {
            id: "c1".into(),
            phone: Some("+1".into()),
            email: Some("a@b.c".into()),
            name: Some("Ann".into()),
            seller_code: None,
        };
        let patch = ContactPatch {
            email: Some(" NEW@B.C ".into()),
            name: Some("   ".into()),
            ..Default::default()
        };
        patch.apply_to(&mut contact);
        assert_eq!(contact.phone.as_deref(), Some("+1"));
        assert_eq!(contact.email.as_deref(), Some("new@b.c"));
        assert_eq!(contact.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn new_bonus_event_stamp_keeps_fields() {
        let now = Utc::now();
        let event = NewBonusEvent {
            id: "E1".into(),
            warranty_id: "w1".into(),
            role: BonusRole::Installer,
            amount: 150,
        }
        .stamp(now);
        assert_eq!(event.id, "E1");
        assert_eq!(event.role, BonusRole::Installer);
        assert_eq!(event.created_at, now);
    }
}
