// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use tracing::info;
use warrantor_core::{AdapterType, CodeDelivery, HealthStatus, PluginAdapter, WarrantorError};

/// Development delivery: writes the code to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDelivery;

#[async_trait]
impl PluginAdapter for LoggingDelivery {
    fn name(&self) -> &str {
        "logging-delivery"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CodeDelivery
    }

    async fn health_check(&self) -> Result<HealthStatus, WarrantorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WarrantorError> {
        Ok(())
    }
}

#[async_trait]
impl CodeDelivery for LoggingDelivery {
    async fn deliver(&self, identifier: &str, code: &str) -> Result<(), WarrantorError> {
        info!(identifier, code, "one-time code (logging delivery)");
        Ok(())
    }
}
