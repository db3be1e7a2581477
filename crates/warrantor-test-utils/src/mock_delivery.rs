// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock one-time-code delivery for deterministic testing.
//!
//! Delivery runs on a spawned task, so tests wait for a code with
//! [`MockDelivery::wait_for_code`] instead of reading it immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use warrantor_core::{AdapterType, CodeDelivery, HealthStatus, PluginAdapter, WarrantorError};

/// Captures `(identifier, code)` pairs instead of sending them.
#[derive(Debug, Default)]
pub struct MockDelivery {
    sent: Mutex<Vec<(String, String)>>,
    notify: Notify,
    failing: AtomicBool,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery fail after recording it.
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn last_code_for(&self, identifier: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(id, _)| id == identifier)
            .map(|(_, code)| code.clone())
    }

    /// Waits up to a second for `count` deliveries to `identifier` and
    /// returns the latest code.
    pub async fn wait_for_code(&self, identifier: &str, count: usize) -> Option<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let notified = self.notify.notified();
            {
                let sent = self.sent.lock().await;
                let matching: Vec<&String> = sent
                    .iter()
                    .filter(|(id, _)| id == identifier)
                    .map(|(_, code)| code)
                    .collect();
                if matching.len() >= count {
                    return matching.last().map(|c| (*c).clone());
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for MockDelivery {
    fn name(&self) -> &str {
        "mock-delivery"
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
impl CodeDelivery for MockDelivery {
    async fn deliver(&self, identifier: &str, code: &str) -> Result<(), WarrantorError> {
        self.sent
            .lock()
            .await
            .push((identifier.to_string(), code.to_string()));
        self.notify.notify_waiters();
        if self.failing.load(Ordering::SeqCst) {
            return Err(WarrantorError::upstream("mock delivery failure"));
        }
        Ok(())
    }
}
