// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time-code delivery trait.

use async_trait::async_trait;

use crate::error::WarrantorError;
use crate::traits::adapter::PluginAdapter;

/// Hands a one-time code to its recipient (SMS, email, or a log line in development).
///
/// Callers treat delivery as fire-and-forget: an `Err` is logged, never
/// surfaced to the person requesting the code.
#[async_trait]
pub trait CodeDelivery: PluginAdapter {
    async fn deliver(&self, identifier: &str, code: &str) -> Result<(), WarrantorError>;
}
