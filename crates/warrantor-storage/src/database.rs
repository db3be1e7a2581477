// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup and migrations.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Query modules take `&Database` and go through `connection().call()`;
//! no other `Connection` is opened for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use warrantor_core::WarrantorError;

use crate::migrations::run_migrations;

/// Handle to the single-writer SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, WarrantorError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(WarrantorError::storage)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(WarrantorError::storage)?;

        conn.call(move |conn| -> Result<(), WarrantorError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;"
            ))
            .map_err(WarrantorError::storage)?;
            run_migrations(conn)
        })
        .await
        .map_err(WarrantorError::storage)?;

        tracing::debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Map a tokio-rusqlite call error into the storage variant.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WarrantorError {
    WarrantorError::Storage {
        source: Box::new(e),
    }
}
