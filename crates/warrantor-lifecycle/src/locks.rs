// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-ticket async mutexes.
//!
//! Entry points that read a ticket, link a contact and then move its status
//! hold the ticket's lock for the whole sequence, so a seller return cannot
//! interleave with a buyer activation on the same ticket. Different tickets
//! never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct TicketLocks {
    locks: Arc<LockMap>,
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `ticket_id`.
    pub async fn acquire(&self, ticket_id: &str) -> TicketGuard {
        let mutex = self
            .locks
            .entry(ticket_id.to_string())
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;
        TicketGuard {
            guard: Some(guard),
            key: ticket_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of tickets with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock on one ticket. The map entry is dropped with the last holder.
pub struct TicketGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<LockMap>,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
