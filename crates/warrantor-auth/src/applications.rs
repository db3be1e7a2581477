// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public seller applications.
//!
//! A prospective seller names the dealer they work with and agrees to data
//! processing. The application waits as `pending` until an operator approves
//! or rejects it. A second submission for the same email and dealer while
//! the first is still pending returns the first ticket.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};
use warrantor_config::DealerConfig;
use warrantor_core::types::{normalize_email, normalize_phone};
use warrantor_core::{Clock, WarrantorError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Body of the public application form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerApplicationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dealer_code: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerApplication {
    pub ticket_id: String,
    pub dealer_id: String,
    pub dealer_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// What the applicant gets back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTicket {
    pub ticket_id: String,
    pub status: ApplicationStatus,
}

impl From<&SellerApplication> for ApplicationTicket {
    fn from(app: &SellerApplication) -> Self {
        Self {
            ticket_id: app.ticket_id.clone(),
            status: app.status,
        }
    }
}

/// Storage behind [`SellerApplications`].
#[async_trait]
pub trait ApplicationStore: Send + Sync + 'static {
    /// Stores `application` unless one is already pending for the same
    /// email and dealer. Returns the stored record and whether it is new.
    async fn insert_unless_pending(
        &self,
        application: SellerApplication,
    ) -> Result<(SellerApplication, bool), WarrantorError>;

    async fn get(&self, ticket_id: &str) -> Result<Option<SellerApplication>, WarrantorError>;

    /// Moves a pending application to `status`. A decided application is
    /// returned unchanged.
    async fn decide(
        &self,
        ticket_id: &str,
        status: ApplicationStatus,
    ) -> Result<Option<SellerApplication>, WarrantorError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    applications: DashMap<String, SellerApplication>,
    /// `(dealer_id, email)` to the ticket still waiting for a decision.
    pending: DashMap<(String, String), String>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert_unless_pending(
        &self,
        application: SellerApplication,
    ) -> Result<(SellerApplication, bool), WarrantorError> {
        let key = (application.dealer_id.clone(), application.email.clone());
        match self.pending.entry(key) {
            Entry::Occupied(mut held) => {
                if let Some(existing) = self.applications.get(held.get())
                    && existing.status == ApplicationStatus::Pending
                {
                    return Ok((existing.value().clone(), false));
                }
                held.insert(application.ticket_id.clone());
                self.applications
                    .insert(application.ticket_id.clone(), application.clone());
                Ok((application, true))
            }
            Entry::Vacant(slot) => {
                slot.insert(application.ticket_id.clone());
                self.applications
                    .insert(application.ticket_id.clone(), application.clone());
                Ok((application, true))
            }
        }
    }

    async fn get(&self, ticket_id: &str) -> Result<Option<SellerApplication>, WarrantorError> {
        Ok(self.applications.get(ticket_id).map(|a| a.value().clone()))
    }

    async fn decide(
        &self,
        ticket_id: &str,
        status: ApplicationStatus,
    ) -> Result<Option<SellerApplication>, WarrantorError> {
        let (app, released) = {
            let Some(mut app) = self.applications.get_mut(ticket_id) else {
                return Ok(None);
            };
            let released =
                app.status == ApplicationStatus::Pending && status != ApplicationStatus::Pending;
            if released {
                app.status = status;
            }
            (app.value().clone(), released)
        };
        // The applications guard is dropped before touching the index.
        if released {
            let key = (app.dealer_id.clone(), app.email.clone());
            self.pending.remove_if(&key, |_, held| held == ticket_id);
        }
        Ok(Some(app))
    }
}

/// Accepts, deduplicates and tracks public seller applications.
pub struct SellerApplications {
    store: Arc<dyn ApplicationStore>,
    dealers: Vec<DealerConfig>,
    clock: Arc<dyn Clock>,
}

impl SellerApplications {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        dealers: Vec<DealerConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dealers,
            clock,
        }
    }

    pub async fn apply(
        &self,
        req: &SellerApplicationRequest,
    ) -> Result<ApplicationTicket, WarrantorError> {
        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| WarrantorError::bad_request("NAME_REQUIRED", "name is required"))?;
        let email = req
            .email
            .as_deref()
            .and_then(normalize_email)
            .filter(|e| e.contains('@'))
            .ok_or_else(|| {
                WarrantorError::bad_request("EMAIL_REQUIRED", "a valid email is required")
            })?;
        if !req.consent {
            return Err(WarrantorError::bad_request(
                "CONSENT_REQUIRED",
                "consent is required",
            ));
        }
        let code = req.dealer_code.as_deref().map(str::trim).unwrap_or_default();
        let dealer = self.dealer(code).ok_or_else(|| {
            WarrantorError::bad_request("DEALER_CODE_INVALID", "dealer code not found")
        })?;

        let application = SellerApplication {
            ticket_id: uuid::Uuid::new_v4().to_string(),
            dealer_id: dealer.id.trim().to_string(),
            dealer_code: dealer.code.trim().to_string(),
            name: name.to_string(),
            email,
            phone: req.phone.as_deref().and_then(normalize_phone),
            status: ApplicationStatus::Pending,
            submitted_at: self.clock.now(),
        };
        let (stored, created) = self.store.insert_unless_pending(application).await?;
        if created {
            info!(
                ticket_id = %stored.ticket_id,
                dealer_id = %stored.dealer_id,
                "seller application received"
            );
        } else {
            debug!(ticket_id = %stored.ticket_id, "pending seller application reused");
        }
        Ok(ApplicationTicket::from(&stored))
    }

    /// Status of a ticket. A ticket this desk has no record of reads as pending.
    pub async fn status(&self, ticket_id: &str) -> Result<ApplicationStatus, WarrantorError> {
        let ticket_id = ticket_id.trim();
        if ticket_id.is_empty() {
            return Err(WarrantorError::bad_request(
                "TICKET_ID_REQUIRED",
                "ticketId is required",
            ));
        }
        Ok(self
            .store
            .get(ticket_id)
            .await?
            .map_or(ApplicationStatus::Pending, |a| a.status))
    }

    /// Approves or rejects a pending application. Repeating the same
    /// decision is accepted; reversing it is not.
    pub async fn decide(
        &self,
        ticket_id: &str,
        status: ApplicationStatus,
    ) -> Result<ApplicationTicket, WarrantorError> {
        if status == ApplicationStatus::Pending {
            return Err(WarrantorError::bad_request(
                "INVALID_STATUS",
                "status must be approved or rejected",
            ));
        }
        let ticket_id = ticket_id.trim();
        let app = self
            .store
            .decide(ticket_id, status)
            .await?
            .ok_or_else(|| WarrantorError::not_found("seller application", ticket_id))?;
        if app.status != status {
            return Err(WarrantorError::bad_request(
                "APPLICATION_ALREADY_DECIDED",
                "application has already been decided",
            ));
        }
        info!(ticket_id, %status, "seller application decided");
        Ok(ApplicationTicket::from(&app))
    }

    fn dealer(&self, code: &str) -> Option<&DealerConfig> {
        if code.is_empty() {
            return None;
        }
        self.dealers
            .iter()
            .find(|d| d.code.trim().eq_ignore_ascii_case(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warrantor_core::SystemClock;

    fn desk() -> (Arc<InMemoryApplicationStore>, SellerApplications) {
        let store = Arc::new(InMemoryApplicationStore::new());
        let dealers = vec![
            DealerConfig {
                id: "D-1".into(),
                code: "NORTH".into(),
                name: "North Tools".into(),
            },
            DealerConfig {
                id: "D-2".into(),
                code: "SOUTH".into(),
                name: String::new(),
            },
        ];
        let desk = SellerApplications::new(store.clone(), dealers, Arc::new(SystemClock));
        (store, desk)
    }

    fn form(email: &str, dealer_code: &str) -> SellerApplicationRequest {
        SellerApplicationRequest {
            name: Some("Olena".into()),
            email: Some(email.into()),
            phone: Some("+380 67 000 11 22".into()),
            dealer_code: Some(dealer_code.into()),
            consent: true,
        }
    }

    #[tokio::test]
    async fn form_is_validated_before_anything_is_stored() {
        let (store, desk) = desk();
        let cases = [
            (
                SellerApplicationRequest {
                    name: Some("  ".into()),
                    ..form("a@b.c", "NORTH")
                },
                "NAME_REQUIRED",
            ),
            (form("not-an-email", "NORTH"), "EMAIL_REQUIRED"),
            (
                SellerApplicationRequest {
                    consent: false,
                    ..form("a@b.c", "NORTH")
                },
                "CONSENT_REQUIRED",
            ),
            (form("a@b.c", "WEST"), "DEALER_CODE_INVALID"),
            (form("a@b.c", "  "), "DEALER_CODE_INVALID"),
        ];
        for (req, code) in cases {
            let err = desk.apply(&req).await.unwrap_err();
            assert_eq!(err.code(), code);
            assert_eq!(err.http_status(), 400);
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn pending_application_is_reused_per_email_and_dealer() {
        let (store, desk) = desk();
        let first = desk.apply(&form("Olena@Shop.ua", " north ")).await.unwrap();
        assert_eq!(first.status, ApplicationStatus::Pending);

        let again = desk.apply(&form(" olena@shop.ua", "NORTH")).await.unwrap();
        assert_eq!(again.ticket_id, first.ticket_id);

        let other_dealer = desk.apply(&form("olena@shop.ua", "SOUTH")).await.unwrap();
        assert_ne!(other_dealer.ticket_id, first.ticket_id);
        assert_eq!(store.len(), 2);

        let stored = store.get(&first.ticket_id).await.unwrap().unwrap();
        assert_eq!(stored.email, "olena@shop.ua");
        assert_eq!(stored.dealer_id, "D-1");
        assert_eq!(stored.phone.as_deref(), Some("+380670001122"));
    }

    #[tokio::test]
    async fn a_decided_application_frees_the_slot() {
        let (_, desk) = desk();
        let first = desk.apply(&form("a@b.c", "NORTH")).await.unwrap();
        desk.decide(&first.ticket_id, ApplicationStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(
            desk.status(&first.ticket_id).await.unwrap(),
            ApplicationStatus::Rejected
        );

        let second = desk.apply(&form("a@b.c", "NORTH")).await.unwrap();
        assert_ne!(second.ticket_id, first.ticket_id);
        assert_eq!(second.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn decisions_are_final() {
        let (_, desk) = desk();
        let ticket = desk.apply(&form("a@b.c", "NORTH")).await.unwrap();

        let err = desk
            .decide(&ticket.ticket_id, ApplicationStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATUS");

        let approved = desk
            .decide(&ticket.ticket_id, ApplicationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert!(
            desk.decide(&ticket.ticket_id, ApplicationStatus::Approved)
                .await
                .is_ok()
        );

        let err = desk
            .decide(&ticket.ticket_id, ApplicationStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "APPLICATION_ALREADY_DECIDED");

        let err = desk
            .decide("ghost", ApplicationStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn status_names_are_lowercase() {
        assert_eq!(ApplicationStatus::Approved.to_string(), "approved");
        assert_eq!(
            "Rejected".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Rejected
        );
        assert!("maybe".parse::<ApplicationStatus>().is_err());
    }

    #[tokio::test]
    async fn unknown_ticket_reads_as_pending() {
        let (_, desk) = desk();
        assert_eq!(
            desk.status("never-issued").await.unwrap(),
            ApplicationStatus::Pending
        );
        assert_eq!(desk.status(" ").await.unwrap_err().code(), "TICKET_ID_REQUIRED");
    }
}
