// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process registry used for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use warrantor_core::types::{normalize_email, normalize_phone, normalize_seller_code};
use warrantor_core::{
    ActorRole, AdapterType, BonusEvent, Clock, Contact, ContactPatch, HealthStatus, NewBonusEvent,
    PluginAdapter, RegistryGateway, SystemClock, UpsertContact, WarrantorError, Warranty,
    WarrantyStatus,
};

#[derive(Default)]
struct State {
    /// Insertion order decides which contact wins when lookups tie.
    contacts: Vec<Contact>,
    warranties: HashMap<String, Warranty>,
    bonuses: HashMap<String, BonusEvent>,
}

impl State {
    fn contact_where(&self, pred: impl Fn(&Contact) -> bool) -> Option<&Contact> {
        self.contacts.iter().find(|c| pred(c))
    }

    /// `true` when a contact other than `id` already holds the phone or email.
    fn phone_taken(&self, id: &str, phone: &str) -> bool {
        self.contacts
            .iter()
            .any(|c| c.id != id && c.phone.as_deref() == Some(phone))
    }

    fn email_taken(&self, id: &str, email: &str) -> bool {
        self.contacts
            .iter()
            .any(|c| c.id != id && c.email.as_deref() == Some(email))
    }

    fn contact_mut(&mut self, id: &str) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.id == id)
    }

    fn warranty_by_qr(&self, qr: &str) -> Option<&Warranty> {
        self.warranties.values().find(|w| w.qr == qr)
    }
}

/// Registry stub holding everything in memory. Each call runs under one
/// lock acquisition, so single-record writes are atomic.
pub struct MemoryRegistry {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            clock,
        }
    }

    /// Number of stored contacts.
    pub async fn contact_count(&self) -> usize {
        self.state.read().await.contacts.len()
    }

    pub async fn warranty_count(&self) -> usize {
        self.state.read().await.warranties.len()
    }

    async fn link_role(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        let mut state = self.state.write().await;
        let warranty = state
            .warranties
            .get_mut(warranty_id)
            .ok_or_else(|| WarrantorError::not_found("warranty", warranty_id))?;
        let slot = match role {
            ActorRole::Buyer => &mut warranty.buyer_contact_id,
            ActorRole::Seller => &mut warranty.seller_contact_id,
            ActorRole::Installer => &mut warranty.installer_contact_id,
        };
        *slot = Some(contact_id.to_string());
        Ok(warranty.clone())
    }
}

#[async_trait]
impl PluginAdapter for MemoryRegistry {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, WarrantorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WarrantorError> {
        Ok(())
    }
}

#[async_trait]
impl RegistryGateway for MemoryRegistry {
    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, WarrantorError> {
        let Some(phone) = normalize_phone(phone) else {
            return Ok(None);
        };
        let state = self.state.read().await;
        Ok(state
            .contact_where(|c| c.phone.as_deref() == Some(phone.as_str()))
            .cloned())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>, WarrantorError> {
        let Some(email) = normalize_email(email) else {
            return Ok(None);
        };
        let state = self.state.read().await;
        Ok(state
            .contact_where(|c| c.email.as_deref() == Some(email.as_str()))
            .cloned())
    }

    async fn find_contact_by_seller_code(
        &self,
        code: &str,
    ) -> Result<Option<Contact>, WarrantorError> {
        let Some(code) = normalize_seller_code(code) else {
            return Ok(None);
        };
        let state = self.state.read().await;
        Ok(state
            .contact_where(|c| c.seller_code.as_deref() == Some(code.as_str()))
            .cloned())
    }

    async fn upsert_contact(&self, input: &UpsertContact) -> Result<Contact, WarrantorError> {
        let input = input.normalized();
        let mut state = self.state.write().await;

        let matched = input
            .phone
            .as_deref()
            .and_then(|p| state.contact_where(|c| c.phone.as_deref() == Some(p)))
            .or_else(|| {
                input
                    .email
                    .as_deref()
                    .and_then(|e| state.contact_where(|c| c.email.as_deref() == Some(e)))
            })
            .map(|c| c.id.clone());

        if let Some(id) = matched {
            let mut patch = ContactPatch::from(input.clone());
            if patch.phone.as_deref().is_some_and(|p| state.phone_taken(&id, p)) {
                debug!(contact_id = %id, "phone held by another contact, not merged");
                patch.phone = None;
            }
            if patch.email.as_deref().is_some_and(|e| state.email_taken(&id, e)) {
                debug!(contact_id = %id, "email held by another contact, not merged");
                patch.email = None;
            }
            if let Some(contact) = state.contact_mut(&id) {
                patch.apply_to(contact);
                return Ok(contact.clone());
            }
        }

        let contact = Contact {
            id: uuid::Uuid::new_v4().to_string(),
            phone: input.phone,
            email: input.email,
            name: input.name,
            seller_code: None,
        };
        state.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, WarrantorError> {
        let patch = patch.normalized();
        let mut state = self.state.write().await;
        if patch.phone.as_deref().is_some_and(|p| state.phone_taken(id, p)) {
            return Err(taken("phone"));
        }
        if patch.email.as_deref().is_some_and(|e| state.email_taken(id, e)) {
            return Err(taken("email"));
        }
        let contact = state
            .contact_mut(id)
            .ok_or_else(|| WarrantorError::not_found("contact", id))?;
        patch.apply_to(contact);
        Ok(contact.clone())
    }

    async fn find_warranty_by_qr(&self, qr: &str) -> Result<Option<Warranty>, WarrantorError> {
        let state = self.state.read().await;
        Ok(state.warranty_by_qr(qr.trim()).cloned())
    }

    async fn find_warranty_by_id(&self, id: &str) -> Result<Option<Warranty>, WarrantorError> {
        Ok(self.state.read().await.warranties.get(id).cloned())
    }

    async fn create_warranty(
        &self,
        qr: &str,
        meta: Option<Value>,
    ) -> Result<Warranty, WarrantorError> {
        let qr = qr.trim();
        if qr.is_empty() {
            return Err(WarrantorError::bad_request("QR_REQUIRED", "qr is required"));
        }

        let mut state = self.state.write().await;
        if let Some(existing) = state.warranty_by_qr(qr) {
            return Ok(existing.clone());
        }

        let warranty = Warranty {
            id: uuid::Uuid::new_v4().to_string(),
            qr: qr.to_string(),
            status: Some(WarrantyStatus::Draft),
            created_at: self.clock.now(),
            buyer_contact_id: None,
            seller_contact_id: None,
            installer_contact_id: None,
            meta,
        };
        state.warranties.insert(warranty.id.clone(), warranty.clone());
        Ok(warranty)
    }

    async fn link_buyer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Buyer, warranty_id, contact_id).await
    }

    async fn link_seller(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Seller, warranty_id, contact_id).await
    }

    async fn link_installer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Installer, warranty_id, contact_id).await
    }

    async fn update_warranty_status(
        &self,
        id: &str,
        status: WarrantyStatus,
    ) -> Result<Warranty, WarrantorError> {
        let mut state = self.state.write().await;
        let warranty = state
            .warranties
            .get_mut(id)
            .ok_or_else(|| WarrantorError::not_found("warranty", id))?;
        warranty.status = Some(status);
        Ok(warranty.clone())
    }

    async fn delete_warranty(&self, id: &str) -> Result<bool, WarrantorError> {
        let mut state = self.state.write().await;
        let removed = state.warranties.remove(id).is_some();
        let before = state.bonuses.len();
        state.bonuses.retain(|_, b| b.warranty_id != id);
        Ok(removed || state.bonuses.len() != before)
    }

    async fn has_bonus(&self, event_id: &str) -> Result<bool, WarrantorError> {
        Ok(self.state.read().await.bonuses.contains_key(event_id))
    }

    async fn add_bonus(&self, event: &NewBonusEvent) -> Result<BonusEvent, WarrantorError> {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let stored = state
            .bonuses
            .entry(event.id.clone())
            .or_insert_with(|| event.clone().stamp(now));
        Ok(stored.clone())
    }
}

fn taken(field: &str) -> WarrantorError {
    WarrantorError::conflict(
        "CONTACT_CONFLICT",
        format!("{field} already belongs to another contact"),
    )
}
