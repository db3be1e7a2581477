// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry gateway backends and the factory that picks one at startup.
//!
//! Consumers only ever see `Arc<dyn RegistryGateway>`; which backend sits
//! behind it is decided once, from `[registry] backend`.

pub mod http;
pub mod memory;

use std::sync::Arc;

use tracing::info;
use warrantor_config::{RegistryBackend, WarrantorConfig};
use warrantor_core::{RegistryGateway, WarrantorError};
use warrantor_storage::SqliteRegistry;

pub use http::HttpRegistry;
pub use memory::MemoryRegistry;

/// Construct the configured registry backend.
pub async fn build_registry(
    config: &WarrantorConfig,
) -> Result<Arc<dyn RegistryGateway>, WarrantorError> {
    let registry: Arc<dyn RegistryGateway> = match config.registry.backend {
        RegistryBackend::Memory => Arc::new(MemoryRegistry::new()),
        RegistryBackend::Sqlite => {
            Arc::new(SqliteRegistry::open(config.storage.clone()).await?)
        }
        RegistryBackend::Http => Arc::new(HttpRegistry::new(&config.registry)?),
    };
    info!(backend = %config.registry.backend, adapter = registry.name(), "registry backend ready");
    Ok(registry)
}
