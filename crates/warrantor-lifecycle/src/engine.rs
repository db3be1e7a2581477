// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The warranty lifecycle state machine.
//!
//! ```text
//!            seller attach / buyer activate
//!   draft  ─────────────────────────────────▶ pending_activation
//!     ▲                                              │
//!     └────────────── seller return ─────────────────┘
//!
//!   pending_activation ──(external timer / admin)──▶ active | expired
//! ```
//!
//! Nothing here moves a ticket to `active`. Every mutating entry point
//! validates against the ticket it read under the ticket's lock, before
//! any write.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use warrantor_core::{
    ActorRole, NotificationSink, RegistryGateway, Warranty, WarrantorError, WarrantyStatus,
};

use crate::locks::{TicketGuard, TicketLocks};
use crate::model::{
    ActivateOutcome, ActivationKind, BuyerActivation, BuyerCheck, CompleteInstallation,
    EnsureContact, InstallerCheck, InstallerCompletion, StatusOutcome,
};
use crate::registration::{ActorRegistration, non_blank, resolve_ticket};

/// Entry points that move warranty tickets between states.
#[derive(Clone)]
pub struct WarrantyLifecycle {
    registry: Arc<dyn RegistryGateway>,
    sink: Arc<dyn NotificationSink>,
    actors: ActorRegistration,
    locks: TicketLocks,
}

impl WarrantyLifecycle {
    pub fn new(registry: Arc<dyn RegistryGateway>, sink: Arc<dyn NotificationSink>) -> Self {
        let actors = ActorRegistration::new(Arc::clone(&registry), Arc::clone(&sink));
        Self {
            registry,
            sink,
            actors,
            locks: TicketLocks::new(),
        }
    }

    /// The "ensure" service sharing this engine's registry and sink.
    pub fn actors(&self) -> &ActorRegistration {
        &self.actors
    }

    /// Looks a ticket up by its scanned code, creating a draft when none exists.
    ///
    /// A buyer is linked only when the ticket has none yet. The status is
    /// never moved here.
    #[instrument(skip(self), fields(qr = %qr))]
    pub async fn activate_by_code(
        &self,
        qr: &str,
        buyer_contact_id: Option<&str>,
    ) -> Result<ActivateOutcome, WarrantorError> {
        let qr = non_blank(Some(qr))
            .ok_or_else(|| WarrantorError::bad_request("QR_REQUIRED", "qr is required"))?;
        let buyer = non_blank(buyer_contact_id);

        if let Some(found) = self.registry.find_warranty_by_qr(qr).await? {
            let _guard = self.locks.acquire(&found.id).await;
            let current = self
                .registry
                .find_warranty_by_id(&found.id)
                .await?
                .unwrap_or(found);
            let warranty = match buyer {
                Some(contact_id) if current.buyer_contact_id.is_none() => {
                    self.actors
                        .link(ActorRole::Buyer, &current.id, contact_id)
                        .await?
                }
                _ => current,
            };
            debug!(warranty_id = %warranty.id, "existing warranty found by code");
            return Ok(ActivateOutcome {
                status: ActivationKind::Found,
                warranty,
            });
        }

        let created = self.registry.create_warranty(qr, None).await?;
        info!(warranty_id = %created.id, "warranty created from scanned code");
        let warranty = match buyer {
            Some(contact_id) => {
                let _guard = self.locks.acquire(&created.id).await;
                self.actors
                    .link(ActorRole::Buyer, &created.id, contact_id)
                    .await?
            }
            None => created,
        };
        Ok(ActivateOutcome {
            status: ActivationKind::Created,
            warranty,
        })
    }

    /// Links a seller and opens the return window on a draft ticket.
    #[instrument(skip(self))]
    pub async fn attach_seller(
        &self,
        warranty_id: &str,
        seller_contact_id: &str,
    ) -> Result<StatusOutcome, WarrantorError> {
        let seller = require(
            Some(seller_contact_id),
            "CONTACT_ID_REQUIRED",
            "sellerContactId",
        )?;
        let (_guard, ticket) = self.lock_ticket(warranty_id).await?;

        if ticket.is_expired() {
            return Err(expired());
        }

        let linked = self
            .actors
            .link(ActorRole::Seller, &ticket.id, seller)
            .await?;
        let status = if ticket.is_draft_like() {
            self.transition(&ticket, WarrantyStatus::PendingActivation)
                .await?
        } else {
            status_of(&linked)
        };

        Ok(StatusOutcome {
            warranty_id: ticket.id,
            status,
        })
    }

    /// Takes a pending ticket back to draft. Draft tickets are left alone.
    #[instrument(skip(self))]
    pub async fn return_warranty(
        &self,
        warranty_id: &str,
    ) -> Result<StatusOutcome, WarrantorError> {
        let (_guard, ticket) = self.lock_ticket(warranty_id).await?;

        let status = match ticket.status {
            Some(WarrantyStatus::Active) => {
                return Err(WarrantorError::bad_request(
                    "RETURN_NOT_ALLOWED",
                    "warranty is already active and cannot be returned",
                ));
            }
            Some(WarrantyStatus::Expired) => return Err(expired()),
            Some(WarrantyStatus::PendingActivation) => {
                self.transition(&ticket, WarrantyStatus::Draft).await?
            }
            None | Some(WarrantyStatus::Draft) => {
                debug!(warranty_id = %ticket.id, "return on draft warranty is a no-op");
                WarrantyStatus::Draft
            }
        };

        Ok(StatusOutcome {
            warranty_id: ticket.id,
            status,
        })
    }

    pub async fn check_for_buyer(&self, warranty_id: &str) -> Result<BuyerCheck, WarrantorError> {
        let ticket = self.find_ticket(warranty_id).await?;
        Ok(buyer_check(ticket))
    }

    /// Ensures the buyer, links them and opens the return window on a draft
    /// ticket. A repeated submission on a pending ticket only refreshes the
    /// buyer's details.
    #[instrument(skip(self, req), fields(warranty_id = ?req.warranty_id))]
    pub async fn activate_for_buyer(
        &self,
        req: &EnsureContact,
    ) -> Result<BuyerActivation, WarrantorError> {
        let presented = req.warranty_id.as_deref().unwrap_or_default();
        let (_guard, ticket) = self.lock_ticket(presented).await?;

        if ticket.is_expired() {
            return Err(expired());
        }
        if ticket.is_active() {
            return Err(WarrantorError::bad_request(
                "WARRANTY_ALREADY_ACTIVE",
                "warranty is already fully activated",
            ));
        }

        let unlinked = EnsureContact {
            warranty_id: None,
            ..req.clone()
        };
        let contact = self.actors.ensure(ActorRole::Buyer, &unlinked).await?;
        let mut warranty = self
            .actors
            .link(ActorRole::Buyer, &ticket.id, &contact.id)
            .await?;

        let status = if ticket.is_draft_like() {
            self.transition(&ticket, WarrantyStatus::PendingActivation)
                .await?;
            warranty.status = Some(WarrantyStatus::PendingActivation);
            Some(WarrantyStatus::PendingActivation)
        } else {
            ticket.status
        };

        Ok(BuyerActivation {
            contact,
            warranty,
            status,
        })
    }

    pub async fn check_for_installer(
        &self,
        warranty_id: &str,
    ) -> Result<InstallerCheck, WarrantorError> {
        let ticket = self.find_ticket(warranty_id).await?;
        let is_expired = ticket.is_expired();
        Ok(InstallerCheck {
            warranty_id: ticket.id,
            status: ticket.status,
            is_expired,
            installer_contact_id: ticket.installer_contact_id,
            can_complete: !is_expired,
        })
    }

    /// Links the installer. Re-linking is allowed and the status never changes.
    #[instrument(skip(self, req), fields(warranty_id = %req.warranty_id))]
    pub async fn complete_installation(
        &self,
        req: &CompleteInstallation,
    ) -> Result<InstallerCompletion, WarrantorError> {
        let installer = require(
            Some(&req.installer_contact_id),
            "CONTACT_ID_REQUIRED",
            "installerContactId",
        )?;
        let (_guard, ticket) = self.lock_ticket(&req.warranty_id).await?;

        if ticket.is_expired() {
            return Err(expired());
        }

        let installation_date = non_blank(req.installation_date.as_deref()).map(String::from);
        let comment = non_blank(req.comment.as_deref()).map(String::from);

        let mut extra = Map::new();
        if let Some(date) = &installation_date {
            extra.insert("installationDate".into(), Value::from(date.as_str()));
        }
        if let Some(comment) = &comment {
            extra.insert("comment".into(), Value::from(comment.as_str()));
        }

        let warranty = self
            .actors
            .link_with(ActorRole::Installer, &ticket.id, installer, extra)
            .await?;

        Ok(InstallerCompletion {
            warranty_id: warranty.id,
            installer_contact_id: installer.to_string(),
            status: warranty.status,
            installation_date,
            comment,
        })
    }

    /// Admin override: writes any status without checking the current one.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        warranty_id: &str,
        status: WarrantyStatus,
    ) -> Result<Warranty, WarrantorError> {
        let id = require(Some(warranty_id), "WARRANTY_ID_REQUIRED", "warrantyId")?;
        let _guard = self.locks.acquire(id).await;
        let warranty = self.registry.update_warranty_status(id, status).await?;
        info!(warranty_id = %warranty.id, status = %status, "warranty status overridden");
        self.sink
            .notify_status_changed(&warranty.id, status.as_ref())
            .await;
        Ok(warranty)
    }

    /// Deletes the ticket and its bonus ledger rows, whatever its status.
    #[instrument(skip(self))]
    pub async fn delete(&self, warranty_id: &str) -> Result<bool, WarrantorError> {
        let id = require(Some(warranty_id), "WARRANTY_ID_REQUIRED", "warrantyId")?;
        let _guard = self.locks.acquire(id).await;
        let deleted = self.registry.delete_warranty(id).await?;
        info!(warranty_id = id, deleted, "warranty delete requested");
        Ok(deleted)
    }

    async fn find_ticket(&self, presented: &str) -> Result<Warranty, WarrantorError> {
        let presented = require(Some(presented), "WARRANTY_ID_REQUIRED", "warrantyId")?;
        resolve_ticket(self.registry.as_ref(), presented)
            .await?
            .ok_or_else(|| not_found(presented))
    }

    /// Resolves the ticket, takes its lock, and re-reads it under the lock.
    async fn lock_ticket(
        &self,
        presented: &str,
    ) -> Result<(TicketGuard, Warranty), WarrantorError> {
        let resolved = self.find_ticket(presented).await?;
        let guard = self.locks.acquire(&resolved.id).await;
        let ticket = self
            .registry
            .find_warranty_by_id(&resolved.id)
            .await?
            .ok_or_else(|| not_found(presented))?;
        Ok((guard, ticket))
    }

    async fn transition(
        &self,
        ticket: &Warranty,
        to: WarrantyStatus,
    ) -> Result<WarrantyStatus, WarrantorError> {
        let updated = self.registry.update_warranty_status(&ticket.id, to).await?;
        info!(
            warranty_id = %ticket.id,
            from = ticket.status.as_ref().map_or("none", |s| s.as_ref()),
            to = %to,
            "warranty status changed"
        );
        self.sink.notify_status_changed(&updated.id, to.as_ref()).await;
        Ok(to)
    }
}

fn buyer_check(ticket: Warranty) -> BuyerCheck {
    BuyerCheck {
        is_activated: ticket.buyer_contact_id.is_some() || ticket.is_active(),
        is_expired: ticket.is_expired(),
        warranty_id: ticket.id,
        status: ticket.status,
        buyer_contact_id: ticket.buyer_contact_id,
    }
}

fn status_of(warranty: &Warranty) -> WarrantyStatus {
    warranty.status.unwrap_or(WarrantyStatus::Draft)
}

fn require<'a>(
    value: Option<&'a str>,
    code: &'static str,
    field: &str,
) -> Result<&'a str, WarrantorError> {
    non_blank(value)
        .ok_or_else(|| WarrantorError::bad_request(code, format!("{field} is required")))
}

fn expired() -> WarrantorError {
    WarrantorError::bad_request("WARRANTY_EXPIRED", "warranty has expired")
}

fn not_found(presented: &str) -> WarrantorError {
    WarrantorError::bad_request("WARRANTY_NOT_FOUND", "warranty not found")
        .with_details(serde_json::json!({ "warrantyId": presented }))
}
