// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on open.

use warrantor_core::WarrantorError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), WarrantorError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(WarrantorError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(name = %migration.name(), version = migration.version(), "applied migration");
    }
    Ok(())
}
