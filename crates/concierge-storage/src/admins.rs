// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`AdminDirectory`].

use async_trait::async_trait;
use concierge_core::{
    AdapterType, AdminDirectory, ConciergeError, HealthStatus, PluginAdapter, UserId,
};
use rusqlite::params;
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// Admin set persisted in the `admins` table.
pub struct SqliteAdminStore {
    db: Database,
}

impl SqliteAdminStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn open(path: &str) -> Result<Self, ConciergeError> {
        Ok(Self::new(Database::open(path).await?))
    }
}

fn to_sql_id(user: UserId) -> Result<i64, ConciergeError> {
    i64::try_from(user.0).map_err(|_| ConciergeError::Storage {
        source: format!("user id {user} does not fit in a SQLite integer").into(),
    })
}

#[async_trait]
impl PluginAdapter for SqliteAdminStore {
    fn name(&self) -> &str {
        "sqlite-admins"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        self.db.checkpoint().await?;
        debug!("admin store shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl AdminDirectory for SqliteAdminStore {
    async fn contains(&self, user: UserId) -> Result<bool, ConciergeError> {
        let id = to_sql_id(user)?;
        self.db
            .connection()
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM admins WHERE user_id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list(&self) -> Result<Vec<UserId>, ConciergeError> {
        let ids: Vec<i64> = self
            .db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT user_id FROM admins ORDER BY user_id ASC")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut ids = Vec::new();
                for row in rows {
                    ids.push(row?);
                }
                Ok(ids)
            })
            .await
            .map_err(map_tr_err)?;

        Ok(ids
            .into_iter()
            .filter_map(|id| u64::try_from(id).ok().map(UserId))
            .collect())
    }

    async fn add(&self, user: UserId) -> Result<(), ConciergeError> {
        let id = to_sql_id(user)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO admins (user_id, created_at) VALUES (?1, ?2)",
                    params![id, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, user: UserId) -> Result<bool, ConciergeError> {
        let id = to_sql_id(user)?;
        let deleted = self
            .db
            .connection()
            .call(move |conn| conn.execute("DELETE FROM admins WHERE user_id = ?1", params![id]))
            .await
            .map_err(map_tr_err)?;
        Ok(deleted > 0)
    }
}
