// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Find-or-create of contacts for a role, with optional ticket linkage.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};
use warrantor_core::{
    ActorRole, Contact, ContactPatch, NotificationSink, RegistryGateway, Warranty,
    WarrantorError,
};

use crate::model::EnsureContact;

/// Shared "ensure" logic for sellers, installers and buyers.
#[derive(Clone)]
pub struct ActorRegistration {
    registry: Arc<dyn RegistryGateway>,
    sink: Arc<dyn NotificationSink>,
}

impl ActorRegistration {
    pub fn new(registry: Arc<dyn RegistryGateway>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { registry, sink }
    }

    pub async fn ensure_seller(&self, req: &EnsureContact) -> Result<Contact, WarrantorError> {
        self.ensure(ActorRole::Seller, req).await
    }

    pub async fn ensure_installer(&self, req: &EnsureContact) -> Result<Contact, WarrantorError> {
        self.ensure(ActorRole::Installer, req).await
    }

    /// Buyers must be identifiable by contact id, phone or email.
    pub async fn ensure_buyer(&self, req: &EnsureContact) -> Result<Contact, WarrantorError> {
        self.ensure(ActorRole::Buyer, req).await
    }

    /// Updates the given contact, or upserts one from phone/email/name, then
    /// links it to `req.warranty_id` when present.
    pub async fn ensure(
        &self,
        role: ActorRole,
        req: &EnsureContact,
    ) -> Result<Contact, WarrantorError> {
        if role == ActorRole::Buyer && !req.identifies_someone() {
            return Err(WarrantorError::bad_request(
                "BUYER_IDENTITY_REQUIRED",
                "buyer phone or email is required",
            ));
        }

        let contact = self.resolve_contact(req).await?;
        debug!(role = %role, contact_id = %contact.id, "contact ensured");

        if let Some(warranty_id) = non_blank(req.warranty_id.as_deref()) {
            let ticket = resolve_ticket(self.registry.as_ref(), warranty_id)
                .await?
                .ok_or_else(|| WarrantorError::not_found("warranty", warranty_id))?;
            self.link(role, &ticket.id, &contact.id).await?;
        }

        Ok(contact)
    }

    pub(crate) async fn resolve_contact(
        &self,
        req: &EnsureContact,
    ) -> Result<Contact, WarrantorError> {
        match non_blank(req.contact_id.as_deref()) {
            Some(id) => {
                let patch = ContactPatch::from(req.identity());
                self.registry.update_contact(id, &patch).await
            }
            None => self.registry.upsert_contact(&req.identity()).await,
        }
    }

    pub(crate) async fn link(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_with(role, warranty_id, contact_id, Map::new()).await
    }

    /// Links `contact_id` in `role` and announces the change, plus any
    /// `extra` fields, to the ticket's observers.
    pub(crate) async fn link_with(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
        mut extra: Map<String, Value>,
    ) -> Result<Warranty, WarrantorError> {
        let warranty = self.registry.link(role, warranty_id, contact_id).await?;
        info!(
            warranty_id = %warranty.id,
            contact_id,
            role = %role,
            "contact linked to warranty"
        );
        extra.insert("role".into(), Value::from(role.as_ref()));
        extra.insert("contactId".into(), Value::from(contact_id));
        self.sink
            .notify_updated(&warranty.id, Value::Object(extra))
            .await;
        Ok(warranty)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Looks a presented ticket identifier up by id, then by scanned code.
pub(crate) async fn resolve_ticket(
    registry: &dyn RegistryGateway,
    presented: &str,
) -> Result<Option<Warranty>, WarrantorError> {
    if let Some(found) = registry.find_warranty_by_id(presented).await? {
        return Ok(Some(found));
    }
    registry.find_warranty_by_qr(presented).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use warrantor_core::ErrorKind;
    use warrantor_registry::MemoryRegistry;
    use warrantor_test_utils::RecordingSink;

    fn setup() -> (Arc<MemoryRegistry>, Arc<RecordingSink>, ActorRegistration) {
        let registry = Arc::new(MemoryRegistry::new());
        let sink = Arc::new(RecordingSink::new());
        let reg = ActorRegistration::new(registry.clone(), sink.clone());
        (registry, sink, reg)
    }

    #[tokio::test]
    async fn buyer_without_identity_is_rejected() {
        let (registry, _, reg) = setup();
        let err = reg
            .ensure_buyer(&EnsureContact {
                name: Some("Anon".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BUYER_IDENTITY_REQUIRED");
        assert_eq!(registry.contact_count().await, 0);
    }

    #[tokio::test]
    async fn seller_tolerates_empty_input() {
        let (_, _, reg) = setup();
        let contact = reg.ensure_seller(&EnsureContact::default()).await.unwrap();
        assert!(contact.phone.is_none());
    }

    #[tokio::test]
    async fn same_phone_resolves_to_same_contact() {
        let (registry, _, reg) = setup();
        let req = EnsureContact {
            phone: Some("+380501112233".into()),
            name: Some("Olha".into()),
            ..Default::default()
        };
        let a = reg.ensure_installer(&req).await.unwrap();
        let b = reg.ensure_installer(&req).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(registry.contact_count().await, 1);
    }

    #[tokio::test]
    async fn contact_id_updates_instead_of_upserting() {
        let (registry, _, reg) = setup();
        let first = reg
            .ensure_seller(&EnsureContact {
                phone: Some("+1".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = reg
            .ensure_seller(&EnsureContact {
                contact_id: Some(first.id.clone()),
                email: Some("Shop@Example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.phone.as_deref(), Some("+1"));
        assert_eq!(updated.email.as_deref(), Some("shop@example.com"));
        assert_eq!(registry.contact_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_contact_id_is_not_found() {
        let (_, _, reg) = setup();
        let err = reg
            .ensure_installer(&EnsureContact {
                contact_id: Some("missing".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn warranty_link_accepts_scanned_code_and_notifies() {
        let (registry, sink, reg) = setup();
        let ticket = registry.create_warranty("QR-7", None).await.unwrap();

        let contact = reg
            .ensure_buyer(&EnsureContact {
                email: Some("buyer@example.com".into()),
                warranty_id: Some("QR-7".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let linked = registry.find_warranty_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(linked.buyer_contact_id.as_deref(), Some(contact.id.as_str()));

        let updates = sink.updates_for(&ticket.id).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["role"], "buyer");
        assert!(sink.status_changes().await.is_empty());
    }

    #[tokio::test]
    async fn link_to_missing_ticket_fails_after_upsert() {
        let (registry, sink, reg) = setup();
        let err = reg
            .ensure_seller(&EnsureContact {
                phone: Some("+2".into()),
                warranty_id: Some("nope".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        // The contact write is not rolled back.
        assert_eq!(registry.contact_count().await, 1);
        assert!(sink.notifications().await.is_empty());
    }
}
