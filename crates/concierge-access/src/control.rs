// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner/admin policy in one place.
//!
//! Admin removal goes through [`AccessControl::remove_admin`], which revokes
//! connection trust in the same call. Removing an admin directly from the
//! [`AdminDirectory`] would leave their connections trusted.

use std::sync::Arc;

use concierge_core::{AdminDirectory, ConciergeError, ConnectionId, OwnerResolver, UserId};
use serde_json::Value;
use tracing::{info, warn};

use crate::event::BusinessConnectionEvent;
use crate::trust::{ConnectionTrustResolver, TrustDecision};

pub struct AccessControl {
    trust: ConnectionTrustResolver,
    admins: Arc<dyn AdminDirectory>,
}

impl AccessControl {
    pub fn new(trust: ConnectionTrustResolver, admins: Arc<dyn AdminDirectory>) -> Self {
        Self { trust, admins }
    }

    pub fn trust(&self) -> &ConnectionTrustResolver {
        &self.trust
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.trust.is_owner(user)
    }

    /// Direct bot chats: owners and admins only, everyone when no owners are set.
    pub async fn may_use_bot(&self, user: Option<UserId>) -> bool {
        if !self.trust.owner_checks_enabled() {
            return true;
        }
        let Some(user) = user else {
            return false;
        };
        if self.trust.is_owner(user) {
            return true;
        }
        self.admins.contains(user).await.unwrap_or_else(|e| {
            warn!(user_id = %user, error = %e, "admin lookup failed");
            false
        })
    }

    pub async fn authorize_business(
        &mut self,
        connection: Option<&ConnectionId>,
        resolver: &dyn OwnerResolver,
    ) -> TrustDecision {
        self.trust
            .authorize(connection, resolver, self.admins.as_ref())
            .await
    }

    /// Normalizes a raw business-connection payload and applies it.
    pub fn on_connection_event(&mut self, payload: &Value) -> Result<TrustDecision, ConciergeError> {
        let event = BusinessConnectionEvent::from_value(payload)?;
        Ok(self.trust.on_authorization_event(&event))
    }

    pub async fn add_admin(&self, user: UserId) -> Result<(), ConciergeError> {
        self.admins.add(user).await?;
        info!(user_id = %user, "admin added");
        Ok(())
    }

    /// Removes `user` and, if they were an admin, revokes their connections.
    pub async fn remove_admin(&mut self, user: UserId) -> Result<bool, ConciergeError> {
        let removed = self.admins.remove(user).await?;
        if removed {
            let revoked = self.trust.revoke(user);
            info!(user_id = %user, revoked = revoked.len(), "admin removed");
        }
        Ok(removed)
    }

    pub async fn list_admins(&self) -> Result<Vec<UserId>, ConciergeError> {
        self.admins.list().await
    }

    /// Current admins for a notification fan-out. Empty when the admin set
    /// cannot be read, so owners still get alerted.
    pub async fn admin_snapshot(&self) -> Vec<UserId> {
        self.admins.list().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not list admins for notification");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admins::MemoryAdminDirectory;
    use crate::trust::{AllowReason, ConnectionState};
    use serde_json::json;
    use std::time::Duration;

    fn control(owners: Vec<UserId>) -> AccessControl {
        AccessControl::new(
            ConnectionTrustResolver::new(owners, true, Duration::from_secs(1)),
            Arc::new(MemoryAdminDirectory::default()),
        )
    }

    #[tokio::test]
    async fn remove_admin_revokes_connections() {
        let mut access = control(vec![UserId(1)]);
        access.add_admin(UserId(2)).await.unwrap();
        let decision = access
            .on_connection_event(&json!({"id": "c", "user": {"id": 2}}))
            .unwrap();
        assert!(!decision.is_allowed());

        let conn = ConnectionId::from("c");
        assert!(access.remove_admin(UserId(2)).await.unwrap());
        assert_eq!(access.trust().state(&conn), ConnectionState::Unknown);
        assert!(!access.remove_admin(UserId(2)).await.unwrap());
    }

    #[tokio::test]
    async fn owner_event_is_trusted() {
        let mut access = control(vec![UserId(1)]);
        let decision = access
            .on_connection_event(&json!({"id": "c", "user": {"id": 1}}))
            .unwrap();
        assert_eq!(decision, TrustDecision::Allowed(AllowReason::Authorized(UserId(1))));
    }

    #[tokio::test]
    async fn malformed_event_is_an_error() {
        let mut access = control(vec![UserId(1)]);
        assert!(access.on_connection_event(&json!({"foo": 1})).is_err());
    }

    #[tokio::test]
    async fn bot_access_for_owners_and_admins() {
        let access = control(vec![UserId(1)]);
        access.add_admin(UserId(2)).await.unwrap();
        assert!(access.may_use_bot(Some(UserId(1))).await);
        assert!(access.may_use_bot(Some(UserId(2))).await);
        assert!(!access.may_use_bot(Some(UserId(3))).await);
        assert!(!access.may_use_bot(None).await);

        let open = control(Vec::new());
        assert!(open.may_use_bot(None).await);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn revocation_is_logged_with_count() {
        let mut access = control(vec![UserId(1)]);
        access.add_admin(UserId(2)).await.unwrap();
        access
            .on_connection_event(&json!({"id": "c", "user": {"id": 2}}))
            .unwrap();
        access.remove_admin(UserId(2)).await.unwrap();
        assert!(logs_contain("admin removed"));
        assert!(logs_contain("revoked=1"));
    }

    #[tokio::test]
    async fn admin_snapshot_is_sorted() {
        let access = control(vec![UserId(5)]);
        access.add_admin(UserId(3)).await.unwrap();
        access.add_admin(UserId(1)).await.unwrap();
        assert_eq!(access.admin_snapshot().await, vec![UserId(1), UserId(3)]);
    }
}
