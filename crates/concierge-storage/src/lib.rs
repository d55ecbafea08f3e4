// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the admin set.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single background
//! connection thread via `tokio-rusqlite`.

pub mod admins;
pub mod database;
pub mod migrations;

pub use admins::SqliteAdminStore;
pub use database::Database;
