// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bonus ledger writes, idempotent by event id.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::params;
use rusqlite::types::Type;
use warrantor_core::{BonusEvent, BonusRole, NewBonusEvent, WarrantorError};

use crate::database::Database;

pub async fn exists(db: &Database, id: &str) -> Result<bool, WarrantorError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM bonus_events WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert unless the id is already recorded, then return the stored row.
pub async fn insert_once(
    db: &Database,
    event: &NewBonusEvent,
    now: DateTime<Utc>,
) -> Result<BonusEvent, WarrantorError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO bonus_events (id, warranty_id, role, amount, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![event.id, event.warranty_id, event.role.as_ref(), event.amount, now],
            )?;
            if inserted == 0 {
                tracing::debug!(event_id = %event.id, "bonus already recorded");
            }
            conn.query_row(
                "SELECT id, warranty_id, role, amount, created_at FROM bonus_events WHERE id = ?1",
                params![event.id],
                |row| {
                    let role: String = row.get(2)?;
                    let role = BonusRole::from_str(&role).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?;
                    Ok(BonusEvent {
                        id: row.get(0)?,
                        warranty_id: row.get(1)?,
                        role,
                        amount: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
