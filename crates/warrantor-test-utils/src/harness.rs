// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the lifecycle engine, webhook dispatcher and
//! auth services around one registry backend (in-memory by default, or a
//! temp SQLite database), with a recording sink, a mock code delivery and
//! a manual clock in place of their production counterparts.

use std::sync::Arc;

use warrantor_auth::{InMemoryOtpStore, OtpService, RegistrationService, TokenIssuer};
use warrantor_config::{OtpConfig, RegistryBackend, WarrantorConfig};
use warrantor_core::{RegistryGateway, WarrantorError};
use warrantor_lifecycle::WarrantyLifecycle;
use warrantor_registry::build_registry;
use warrantor_webhooks::WebhookDispatcher;

use crate::clock::ManualClock;
use crate::mock_delivery::MockDelivery;
use crate::recording_sink::RecordingSink;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    sqlite: bool,
    otp: OtpConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            sqlite: false,
            otp: OtpConfig::default(),
        }
    }

    /// Back the registry with a fresh SQLite file instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub fn with_otp(mut self, otp: OtpConfig) -> Self {
        self.otp = otp;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, WarrantorError> {
        let mut config = WarrantorConfig {
            otp: self.otp,
            ..WarrantorConfig::default()
        };
        config.auth.token_secret = Some("test-secret".into());

        let temp_dir = if self.sqlite {
            let dir = tempfile::TempDir::new().map_err(WarrantorError::storage)?;
            config.registry.backend = RegistryBackend::Sqlite;
            config.storage.database_path = dir.path().join("registry.db").display().to_string();
            Some(dir)
        } else {
            None
        };

        let registry = build_registry(&config).await?;
        let sink = Arc::new(RecordingSink::new());
        let delivery = Arc::new(MockDelivery::new());
        let clock = Arc::new(ManualClock::default());

        let lifecycle = WarrantyLifecycle::new(registry.clone(), sink.clone());
        let webhooks = WebhookDispatcher::new(sink.clone());
        let otp = OtpService::new(
            Arc::new(InMemoryOtpStore::new()),
            delivery.clone(),
            clock.clone(),
            config.otp.clone(),
        );
        let tokens = TokenIssuer::from_config(&config.auth, clock.clone());
        let accounts = RegistrationService::new(registry.clone(), tokens);

        Ok(TestHarness {
            registry,
            sink,
            delivery,
            clock,
            lifecycle,
            webhooks,
            otp,
            accounts,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete service stack with recording adapters.
pub struct TestHarness {
    pub registry: Arc<dyn RegistryGateway>,
    /// Every realtime push made by the lifecycle and the dispatcher.
    pub sink: Arc<RecordingSink>,
    /// Every one-time code issued.
    pub delivery: Arc<MockDelivery>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: WarrantyLifecycle,
    pub webhooks: WebhookDispatcher,
    pub otp: OtpService,
    pub accounts: RegistrationService,
    pub config: WarrantorConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// In-memory harness with default settings.
    pub async fn new() -> Result<Self, WarrantorError> {
        Self::builder().build().await
    }
}
