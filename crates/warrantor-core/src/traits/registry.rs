// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry gateway trait: uniform access to contacts, warranty tickets and
//! the bonus ledger, whatever backend holds them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WarrantorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ActorRole, BonusEvent, Contact, ContactPatch, NewBonusEvent, UpsertContact, Warranty,
    WarrantyStatus,
};

/// Data access for the external registry.
///
/// Every method is a suspension point and may fail with
/// [`WarrantorError::Upstream`] or [`WarrantorError::Storage`]; callers
/// surface those errors instead of swallowing them. Implementations must be
/// interchangeable, so all of them apply the same normalization: phones and
/// seller codes are trimmed, emails are trimmed and lower-cased.
#[async_trait]
pub trait RegistryGateway: PluginAdapter {
    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, WarrantorError>;

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>, WarrantorError>;

    async fn find_contact_by_seller_code(
        &self,
        code: &str,
    ) -> Result<Option<Contact>, WarrantorError>;

    /// Finds a contact by phone, then by email, and merges the supplied
    /// fields into it. Creates a new contact when neither matches.
    async fn upsert_contact(&self, input: &UpsertContact) -> Result<Contact, WarrantorError>;

    /// Overwrites only the supplied fields. Fails with `NotFound` for an unknown id.
    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, WarrantorError>;

    async fn find_warranty_by_qr(&self, qr: &str) -> Result<Option<Warranty>, WarrantorError>;

    async fn find_warranty_by_id(&self, id: &str) -> Result<Option<Warranty>, WarrantorError>;

    /// Creates a draft ticket, or returns the existing one for this `qr` unchanged.
    async fn create_warranty(
        &self,
        qr: &str,
        meta: Option<Value>,
    ) -> Result<Warranty, WarrantorError>;

    async fn link_buyer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError>;

    async fn link_seller(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError>;

    async fn link_installer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError>;

    async fn update_warranty_status(
        &self,
        id: &str,
        status: WarrantyStatus,
    ) -> Result<Warranty, WarrantorError>;

    /// Deletes the ticket and its bonus ledger rows. Returns whether anything was removed.
    async fn delete_warranty(&self, id: &str) -> Result<bool, WarrantorError>;

    async fn has_bonus(&self, event_id: &str) -> Result<bool, WarrantorError>;

    /// Records a bonus once per event id. Replays return the first record.
    async fn add_bonus(&self, event: &NewBonusEvent) -> Result<BonusEvent, WarrantorError>;

    /// Dispatches to the role-specific link operation.
    async fn link(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        match role {
            ActorRole::Buyer => self.link_buyer(warranty_id, contact_id).await,
            ActorRole::Seller => self.link_seller(warranty_id, contact_id).await,
            ActorRole::Installer => self.link_installer(warranty_id, contact_id).await,
        }
    }
}
