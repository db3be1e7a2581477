// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed storage for pending one-time codes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use warrantor_core::WarrantorError;

/// One issued code awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,
    pub identifier: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_sent_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Storage behind [`crate::OtpService`].
///
/// Records carry their own `expires_at`; the store never decides expiry on
/// its own. An implementation backed by an external cache only has to keep
/// these operations atomic per key.
#[async_trait]
pub trait OtpStore: Send + Sync + 'static {
    async fn insert(&self, otp_id: &str, record: OtpRecord) -> Result<(), WarrantorError>;

    async fn get(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError>;

    /// Increments the attempt counter and returns the updated record.
    async fn record_attempt(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError>;

    async fn touch_sent(&self, otp_id: &str, at: DateTime<Utc>) -> Result<(), WarrantorError>;

    async fn remove(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError>;

    /// When `start` last ran for this identifier.
    async fn last_start(&self, identifier: &str) -> Result<Option<DateTime<Utc>>, WarrantorError>;

    async fn mark_start(&self, identifier: &str, at: DateTime<Utc>) -> Result<(), WarrantorError>;

    /// Drops expired records and start marks older than `start_horizon`.
    /// Returns how many codes were dropped.
    async fn purge(
        &self,
        now: DateTime<Utc>,
        start_horizon: DateTime<Utc>,
    ) -> Result<usize, WarrantorError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryOtpStore {
    records: DashMap<String, OtpRecord>,
    starts: DashMap<String, DateTime<Utc>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn insert(&self, otp_id: &str, record: OtpRecord) -> Result<(), WarrantorError> {
        self.records.insert(otp_id.to_string(), record);
        Ok(())
    }

    async fn get(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError> {
        Ok(self.records.get(otp_id).map(|r| r.value().clone()))
    }

    async fn record_attempt(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError> {
        Ok(self.records.get_mut(otp_id).map(|mut r| {
            r.attempts += 1;
            r.value().clone()
        }))
    }

    async fn touch_sent(&self, otp_id: &str, at: DateTime<Utc>) -> Result<(), WarrantorError> {
        if let Some(mut r) = self.records.get_mut(otp_id) {
            r.last_sent_at = at;
        }
        Ok(())
    }

    async fn remove(&self, otp_id: &str) -> Result<Option<OtpRecord>, WarrantorError> {
        Ok(self.records.remove(otp_id).map(|(_, r)| r))
    }

    async fn last_start(&self, identifier: &str) -> Result<Option<DateTime<Utc>>, WarrantorError> {
        Ok(self.starts.get(identifier).map(|t| *t))
    }

    async fn mark_start(&self, identifier: &str, at: DateTime<Utc>) -> Result<(), WarrantorError> {
        self.starts.insert(identifier.to_string(), at);
        Ok(())
    }

    async fn purge(
        &self,
        now: DateTime<Utc>,
        start_horizon: DateTime<Utc>,
    ) -> Result<usize, WarrantorError> {
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(now));
        self.starts.retain(|_, at| *at >= start_horizon);
        Ok(before.saturating_sub(self.records.len()))
    }
}
