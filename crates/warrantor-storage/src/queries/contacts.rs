// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact lookups, upsert and partial update.
//!
//! Inputs are expected to be normalized by the caller.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use warrantor_core::{Contact, ContactPatch, UpsertContact, WarrantorError};

use crate::database::Database;

const CONTACT_COLUMNS: &str = "id, phone, email, name, seller_code";

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        phone: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        seller_code: row.get(4)?,
    })
}

fn select_one(
    conn: &rusqlite::Connection,
    column: &str,
    value: &str,
) -> rusqlite::Result<Option<Contact>> {
    conn.query_row(
        &format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE {column} = ?1
             ORDER BY created_at ASC LIMIT 1"
        ),
        params![value],
        row_to_contact,
    )
    .optional()
}

/// Whether a contact other than `id` already holds `value` in `column`.
fn held_elsewhere(
    conn: &rusqlite::Connection,
    column: &str,
    value: &str,
    id: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM contacts WHERE {column} = ?1 AND id <> ?2)"),
        params![value, id],
        |row| row.get(0),
    )
}

/// Result of a partial contact update.
pub enum UpdateOutcome {
    Updated(Contact),
    Missing,
    /// The named field already belongs to another contact.
    Taken(&'static str),
}

async fn find_by(
    db: &Database,
    column: &'static str,
    value: &str,
) -> Result<Option<Contact>, WarrantorError> {
    let value = value.to_string();
    db.connection()
        .call(move |conn| select_one(conn, column, &value))
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Contact>, WarrantorError> {
    find_by(db, "id", id).await
}

pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Contact>, WarrantorError> {
    find_by(db, "phone", phone).await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Contact>, WarrantorError> {
    find_by(db, "email", email).await
}

pub async fn find_by_seller_code(
    db: &Database,
    code: &str,
) -> Result<Option<Contact>, WarrantorError> {
    find_by(db, "seller_code", code).await
}

/// Match by phone, then email; merge into the match or insert `new_id`.
///
/// Runs in one transaction so two concurrent upserts for the same phone
/// cannot both insert.
pub async fn upsert(
    db: &Database,
    input: &UpsertContact,
    new_id: String,
    now: DateTime<Utc>,
) -> Result<Contact, WarrantorError> {
    let input = input.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut existing = None;
            if let Some(phone) = &input.phone {
                existing = select_one(&tx, "phone", phone)?;
            }
            if existing.is_none()
                && let Some(email) = &input.email
            {
                existing = select_one(&tx, "email", email)?;
            }

            let contact = match existing {
                Some(mut contact) => {
                    let mut patch = ContactPatch::from(input);
                    if let Some(phone) = &patch.phone
                        && held_elsewhere(&tx, "phone", phone, &contact.id)?
                    {
                        tracing::debug!(
                            contact_id = %contact.id,
                            "phone held by another contact, not merged"
                        );
                        patch.phone = None;
                    }
                    if let Some(email) = &patch.email
                        && held_elsewhere(&tx, "email", email, &contact.id)?
                    {
                        tracing::debug!(
                            contact_id = %contact.id,
                            "email held by another contact, not merged"
                        );
                        patch.email = None;
                    }
                    patch.apply_to(&mut contact);
                    tx.execute(
                        "UPDATE contacts SET phone = ?2, email = ?3, name = ?4, updated_at = ?5
                         WHERE id = ?1",
                        params![contact.id, contact.phone, contact.email, contact.name, now],
                    )?;
                    contact
                }
                None => {
                    let contact = Contact {
                        id: new_id,
                        phone: input.phone,
                        email: input.email,
                        name: input.name,
                        seller_code: None,
                    };
                    tx.execute(
                        "INSERT INTO contacts (id, phone, email, name, seller_code, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
                        params![contact.id, contact.phone, contact.email, contact.name, now],
                    )?;
                    contact
                }
            };

            tx.commit()?;
            Ok(contact)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Overwrite the supplied fields, refusing a phone or email that another
/// contact already holds.
pub async fn update(
    db: &Database,
    id: &str,
    patch: &ContactPatch,
    now: DateTime<Utc>,
) -> Result<UpdateOutcome, WarrantorError> {
    let id = id.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(phone) = &patch.phone
                && held_elsewhere(&tx, "phone", phone, &id)?
            {
                return Ok(UpdateOutcome::Taken("phone"));
            }
            if let Some(email) = &patch.email
                && held_elsewhere(&tx, "email", email, &id)?
            {
                return Ok(UpdateOutcome::Taken("email"));
            }
            let Some(mut contact) = select_one(&tx, "id", &id)? else {
                return Ok(UpdateOutcome::Missing);
            };
            patch.apply_to(&mut contact);
            tx.execute(
                "UPDATE contacts SET phone = ?2, email = ?3, name = ?4, seller_code = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    contact.id,
                    contact.phone,
                    contact.email,
                    contact.name,
                    contact.seller_code,
                    now,
                ],
            )?;
            tx.commit()?;
            Ok(UpdateOutcome::Updated(contact))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
