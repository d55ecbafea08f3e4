// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process admin set, used when no database is configured and in tests.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use concierge_core::{AdminDirectory, ConciergeError, UserId};

#[derive(Debug, Default)]
pub struct MemoryAdminDirectory {
    admins: Mutex<BTreeSet<UserId>>,
}

impl MemoryAdminDirectory {
    pub fn with_admins(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: Mutex::new(admins.into_iter().collect()),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, BTreeSet<UserId>>, ConciergeError> {
        self.admins
            .lock()
            .map_err(|_| ConciergeError::Internal("admin set lock poisoned".into()))
    }
}

#[async_trait]
impl AdminDirectory for MemoryAdminDirectory {
    async fn contains(&self, user: UserId) -> Result<bool, ConciergeError> {
        Ok(self.locked()?.contains(&user))
    }

    async fn list(&self) -> Result<Vec<UserId>, ConciergeError> {
        Ok(self.locked()?.iter().copied().collect())
    }

    async fn add(&self, user: UserId) -> Result<(), ConciergeError> {
        self.locked()?.insert(user);
        Ok(())
    }

    async fn remove(&self, user: UserId) -> Result<bool, ConciergeError> {
        Ok(self.locked()?.remove(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_is_sorted_and_add_is_idempotent() {
        let admins = MemoryAdminDirectory::with_admins([UserId(9), UserId(3)]);
        admins.add(UserId(3)).await.unwrap();
        admins.add(UserId(5)).await.unwrap();
        assert_eq!(
            admins.list().await.unwrap(),
            vec![UserId(3), UserId(5), UserId(9)]
        );
    }

    #[tokio::test]
    async fn remove_reports_whether_present() {
        let admins = MemoryAdminDirectory::with_admins([UserId(1)]);
        assert!(admins.remove(UserId(1)).await.unwrap());
        assert!(!admins.remove(UserId(1)).await.unwrap());
        assert!(!admins.contains(UserId(1)).await.unwrap());
    }
}
