// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the registry gateway.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use warrantor_config::StorageConfig;
use warrantor_core::types::{normalize_email, normalize_phone, normalize_seller_code};
use warrantor_core::{
    ActorRole, AdapterType, BonusEvent, Contact, ContactPatch, HealthStatus, NewBonusEvent,
    PluginAdapter, RegistryGateway, UpsertContact, WarrantorError, Warranty, WarrantyStatus,
};

use crate::database::Database;
use crate::queries;
use crate::queries::contacts::UpdateOutcome;

/// Durable registry backed by a local SQLite file.
///
/// The database is opened by [`SqliteRegistry::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteRegistry {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteRegistry {
    /// Create the adapter. The database is not opened until [`initialize`](Self::initialize).
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, WarrantorError> {
        let registry = Self::new(config);
        registry.initialize().await?;
        Ok(registry)
    }

    pub async fn initialize(&self) -> Result<(), WarrantorError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WarrantorError::Storage {
            source: "registry database already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite registry initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, WarrantorError> {
        self.db.get().ok_or_else(|| WarrantorError::Storage {
            source: "registry database not initialized".into(),
        })
    }

    async fn link_role(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        queries::warranties::link(self.db()?, warranty_id, role, contact_id, Utc::now())
            .await?
            .ok_or_else(|| WarrantorError::not_found("warranty", warranty_id))
    }
}

#[async_trait]
impl PluginAdapter for SqliteRegistry {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, WarrantorError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("database not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WarrantorError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryGateway for SqliteRegistry {
    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, WarrantorError> {
        match normalize_phone(phone) {
            Some(phone) => queries::contacts::find_by_phone(self.db()?, &phone).await,
            None => Ok(None),
        }
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>, WarrantorError> {
        match normalize_email(email) {
            Some(email) => queries::contacts::find_by_email(self.db()?, &email).await,
            None => Ok(None),
        }
    }

    async fn find_contact_by_seller_code(
        &self,
        code: &str,
    ) -> Result<Option<Contact>, WarrantorError> {
        match normalize_seller_code(code) {
            Some(code) => queries::contacts::find_by_seller_code(self.db()?, &code).await,
            None => Ok(None),
        }
    }

    async fn upsert_contact(&self, input: &UpsertContact) -> Result<Contact, WarrantorError> {
        let input = input.normalized();
        let new_id = uuid::Uuid::new_v4().to_string();
        queries::contacts::upsert(self.db()?, &input, new_id, Utc::now()).await
    }

    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, WarrantorError> {
        let patch = patch.normalized();
        match queries::contacts::update(self.db()?, id, &patch, Utc::now()).await? {
            UpdateOutcome::Updated(contact) => Ok(contact),
            UpdateOutcome::Missing => Err(WarrantorError::not_found("contact", id)),
            UpdateOutcome::Taken(field) => Err(WarrantorError::conflict(
                "CONTACT_CONFLICT",
                format!("{field} already belongs to another contact"),
            )),
        }
    }

    async fn find_warranty_by_qr(&self, qr: &str) -> Result<Option<Warranty>, WarrantorError> {
        queries::warranties::find_by_qr(self.db()?, qr.trim()).await
    }

    async fn find_warranty_by_id(&self, id: &str) -> Result<Option<Warranty>, WarrantorError> {
        queries::warranties::find_by_id(self.db()?, id).await
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
        let new_id = uuid::Uuid::new_v4().to_string();
        queries::warranties::create(self.db()?, qr, meta, new_id, Utc::now()).await
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
        queries::warranties::set_status(self.db()?, id, status, Utc::now())
            .await?
            .ok_or_else(|| WarrantorError::not_found("warranty", id))
    }

    async fn delete_warranty(&self, id: &str) -> Result<bool, WarrantorError> {
        queries::warranties::delete(self.db()?, id).await
    }

    async fn has_bonus(&self, event_id: &str) -> Result<bool, WarrantorError> {
        queries::bonuses::exists(self.db()?, event_id).await
    }

    async fn add_bonus(&self, event: &NewBonusEvent) -> Result<BonusEvent, WarrantorError> {
        queries::bonuses::insert_once(self.db()?, event, Utc::now()).await
    }
}
