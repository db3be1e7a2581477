// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warranty ticket CRUD.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde_json::Value;
use warrantor_core::{ActorRole, WarrantorError, Warranty, WarrantyStatus};

use crate::database::Database;

const WARRANTY_COLUMNS: &str =
    "id, qr, status, created_at, buyer_contact_id, seller_contact_id, installer_contact_id, meta";

fn row_to_warranty(row: &Row<'_>) -> rusqlite::Result<Warranty> {
    let status: Option<String> = row.get(2)?;
    let status = status
        .map(|s| {
            WarrantyStatus::from_str(&s)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(Warranty {
        id: row.get(0)?,
        qr: row.get(1)?,
        status,
        created_at: row.get(3)?,
        buyer_contact_id: row.get(4)?,
        seller_contact_id: row.get(5)?,
        installer_contact_id: row.get(6)?,
        meta: row.get(7)?,
    })
}

fn select_one(
    conn: &rusqlite::Connection,
    column: &str,
    value: &str,
) -> rusqlite::Result<Option<Warranty>> {
    conn.query_row(
        &format!("SELECT {WARRANTY_COLUMNS} FROM warranties WHERE {column} = ?1"),
        params![value],
        row_to_warranty,
    )
    .optional()
}

fn link_column(role: ActorRole) -> &'static str {
    match role {
        ActorRole::Buyer => "buyer_contact_id",
        ActorRole::Seller => "seller_contact_id",
        ActorRole::Installer => "installer_contact_id",
    }
}

pub async fn find_by_qr(db: &Database, qr: &str) -> Result<Option<Warranty>, WarrantorError> {
    let qr = qr.to_string();
    db.connection()
        .call(move |conn| select_one(conn, "qr", &qr))
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Warranty>, WarrantorError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_one(conn, "id", &id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a draft ticket unless `qr` is taken; either way return the stored row.
pub async fn create(
    db: &Database,
    qr: &str,
    meta: Option<Value>,
    new_id: String,
    now: DateTime<Utc>,
) -> Result<Warranty, WarrantorError> {
    let qr = qr.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO warranties (id, qr, status, meta, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new_id, qr, WarrantyStatus::Draft.as_ref(), meta, now],
            )?;
            conn.query_row(
                &format!("SELECT {WARRANTY_COLUMNS} FROM warranties WHERE qr = ?1"),
                params![qr],
                row_to_warranty,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the contact reference for `role`. Returns `None` when the ticket is absent.
pub async fn link(
    db: &Database,
    id: &str,
    role: ActorRole,
    contact_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Warranty>, WarrantorError> {
    let id = id.to_string();
    let contact_id = contact_id.to_string();
    let column = link_column(role);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!("UPDATE warranties SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
                params![id, contact_id, now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_one(conn, "id", &id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn set_status(
    db: &Database,
    id: &str,
    status: WarrantyStatus,
    now: DateTime<Utc>,
) -> Result<Option<Warranty>, WarrantorError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE warranties SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status.as_ref(), now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_one(conn, "id", &id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the ticket and its bonus rows in one transaction.
pub async fn delete(db: &Database, id: &str) -> Result<bool, WarrantorError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let bonuses = tx.execute("DELETE FROM bonus_events WHERE warranty_id = ?1", params![id])?;
            let tickets = tx.execute("DELETE FROM warranties WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(tickets > 0 || bonuses > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
