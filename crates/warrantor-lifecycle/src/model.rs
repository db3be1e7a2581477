// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and result shapes for registration and lifecycle entry points.

use serde::{Deserialize, Serialize};
use warrantor_core::{Contact, UpsertContact, Warranty, WarrantyStatus};

/// Find-or-create input shared by every role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureContact {
    /// Existing contact to update instead of upserting.
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Ticket (id or scanned code) to link the contact to.
    #[serde(default)]
    pub warranty_id: Option<String>,
}

impl EnsureContact {
    pub(crate) fn identity(&self) -> UpsertContact {
        UpsertContact {
            phone: self.phone.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    /// `true` when a contact id, phone or email is present and not blank.
    pub fn identifies_someone(&self) -> bool {
        [&self.contact_id, &self.phone, &self.email]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Whether activate-by-code found an existing ticket or created one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Found,
    Created,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivateOutcome {
    pub status: ActivationKind,
    pub warranty: Warranty,
}

/// Ticket id and the status it ended in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutcome {
    pub warranty_id: String,
    pub status: WarrantyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerCheck {
    pub warranty_id: String,
    pub status: Option<WarrantyStatus>,
    /// A buyer is linked or the ticket is already active.
    pub is_activated: bool,
    pub is_expired: bool,
    pub buyer_contact_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerActivation {
    pub contact: Contact,
    pub warranty: Warranty,
    pub status: Option<WarrantyStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerCheck {
    pub warranty_id: String,
    pub status: Option<WarrantyStatus>,
    pub is_expired: bool,
    pub installer_contact_id: Option<String>,
    /// Installation may be completed (ticket not expired).
    pub can_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInstallation {
    pub warranty_id: String,
    pub installer_contact_id: String,
    #[serde(default)]
    pub installation_date: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerCompletion {
    pub warranty_id: String,
    pub installer_contact_id: String,
    pub status: Option<WarrantyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
