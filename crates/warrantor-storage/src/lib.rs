// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Warrantor registry.
//!
//! Contacts, warranty tickets and the bonus ledger live in one WAL-mode
//! database with embedded migrations. Writes go through a single
//! `tokio-rusqlite` connection, so each query function is atomic with
//! respect to the others.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteRegistry;
pub use database::Database;
