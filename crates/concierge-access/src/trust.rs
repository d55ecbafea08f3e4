// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether messages relayed through a business connection may be
//! answered.
//!
//! Per connection: `Unknown -> Resolving -> Trusted | Denied`. Only `Trusted`
//! is sticky. `Denied` is retried on the next message, so a transient lookup
//! failure is never permanent. Revoking an admin returns every connection that
//! admin owns to `Unknown`.

use std::collections::HashMap;
use std::time::Duration;

use concierge_core::{AdminDirectory, ConciergeError, ConnectionId, OwnerResolver, UserId};
use tracing::{debug, info, warn};

use crate::event::BusinessConnectionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    /// An owner lookup is in flight (or was abandoned mid-flight).
    Resolving,
    Trusted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// No owners configured; every connection is accepted.
    OwnerChecksDisabled,
    Cached,
    /// Strict mode is off; the connection was trusted without a lookup.
    NonStrict,
    /// The connection's owner is an owner or admin.
    Authorized(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingConnection,
    /// The platform did not name an owner, or the lookup failed.
    OwnerUnresolved,
    NotAuthorized(UserId),
    /// The admin set could not be consulted.
    AdminLookupFailed(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    Allowed(AllowReason),
    Denied(DenyReason),
}

impl TrustDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TrustDecision::Allowed(_))
    }
}

#[derive(Debug)]
pub struct ConnectionTrustResolver {
    owners: Vec<UserId>,
    strict: bool,
    lookup_timeout: Duration,
    states: HashMap<ConnectionId, ConnectionState>,
    owner_of: HashMap<ConnectionId, UserId>,
}

impl ConnectionTrustResolver {
    pub fn new(owners: Vec<UserId>, strict: bool, lookup_timeout: Duration) -> Self {
        if owners.is_empty() {
            warn!("no owner ids configured, owner checks are disabled");
        } else {
            info!(owners = ?owners, strict, "business connection checks enabled");
        }
        Self {
            owners,
            strict,
            lookup_timeout,
            states: HashMap::new(),
            owner_of: HashMap::new(),
        }
    }

    pub fn owners(&self) -> &[UserId] {
        &self.owners
    }

    pub fn owner_checks_enabled(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Every user counts as an owner when no owners are configured.
    pub fn is_owner(&self, user: UserId) -> bool {
        self.owners.is_empty() || self.owners.contains(&user)
    }

    pub fn state(&self, connection: &ConnectionId) -> ConnectionState {
        self.states
            .get(connection)
            .copied()
            .unwrap_or(ConnectionState::Unknown)
    }

    pub fn cached_owner(&self, connection: &ConnectionId) -> Option<UserId> {
        self.owner_of.get(connection).copied()
    }

    /// Explicit link event. The owner mapping is always recorded, so a later
    /// message from an admin's connection needs no platform lookup.
    pub fn on_authorization_event(&mut self, event: &BusinessConnectionEvent) -> TrustDecision {
        let BusinessConnectionEvent {
            connection_id,
            user_id,
        } = event;
        self.owner_of.insert(connection_id.clone(), *user_id);

        if self.is_owner(*user_id) || !self.strict {
            self.states
                .insert(connection_id.clone(), ConnectionState::Trusted);
            info!(
                connection_id = %connection_id,
                user_id = %user_id,
                strict = self.strict,
                "business connection allowed"
            );
            return TrustDecision::Allowed(AllowReason::Authorized(*user_id));
        }

        self.states
            .insert(connection_id.clone(), ConnectionState::Denied);
        warn!(
            connection_id = %connection_id,
            user_id = %user_id,
            "business connection ignored: user is not an owner"
        );
        TrustDecision::Denied(DenyReason::NotAuthorized(*user_id))
    }

    /// Authorizes an inbound message on `connection`.
    pub async fn authorize(
        &mut self,
        connection: Option<&ConnectionId>,
        resolver: &dyn OwnerResolver,
        admins: &dyn AdminDirectory,
    ) -> TrustDecision {
        if !self.owner_checks_enabled() {
            return TrustDecision::Allowed(AllowReason::OwnerChecksDisabled);
        }
        let Some(connection) = connection else {
            return TrustDecision::Denied(DenyReason::MissingConnection);
        };
        if self.state(connection) == ConnectionState::Trusted {
            return TrustDecision::Allowed(AllowReason::Cached);
        }

        if !self.strict {
            self.states
                .insert(connection.clone(), ConnectionState::Trusted);
            warn!(
                connection_id = %connection,
                "business connection not registered via update, allowing and caching"
            );
            return TrustDecision::Allowed(AllowReason::NonStrict);
        }

        self.states
            .insert(connection.clone(), ConnectionState::Resolving);
        let decision = self.resolve(connection, resolver, admins).await;
        match decision {
            TrustDecision::Allowed(AllowReason::Authorized(user)) => {
                self.states
                    .insert(connection.clone(), ConnectionState::Trusted);
                self.owner_of.insert(connection.clone(), user);
                info!(
                    connection_id = %connection,
                    user_id = %user,
                    "business connection resolved and allowed"
                );
            }
            _ => {
                self.states
                    .insert(connection.clone(), ConnectionState::Denied);
                warn!(connection_id = %connection, ?decision, "blocking business connection");
            }
        }
        decision
    }

    async fn resolve(
        &self,
        connection: &ConnectionId,
        resolver: &dyn OwnerResolver,
        admins: &dyn AdminDirectory,
    ) -> TrustDecision {
        let owner = match self.cached_owner(connection) {
            Some(user) => {
                debug!(connection_id = %connection, user_id = %user, "using cached connection owner");
                Some(user)
            }
            None => self.lookup_owner(connection, resolver).await,
        };
        let Some(user) = owner else {
            return TrustDecision::Denied(DenyReason::OwnerUnresolved);
        };

        if self.is_owner(user) {
            return TrustDecision::Allowed(AllowReason::Authorized(user));
        }
        match admins.contains(user).await {
            Ok(true) => TrustDecision::Allowed(AllowReason::Authorized(user)),
            Ok(false) => TrustDecision::Denied(DenyReason::NotAuthorized(user)),
            Err(e) => {
                warn!(user_id = %user, error = %e, "admin lookup failed");
                TrustDecision::Denied(DenyReason::AdminLookupFailed(user))
            }
        }
    }

    async fn lookup_owner(
        &self,
        connection: &ConnectionId,
        resolver: &dyn OwnerResolver,
    ) -> Option<UserId> {
        let result = tokio::time::timeout(
            self.lookup_timeout,
            resolver.resolve_connection_owner(connection),
        )
        .await
        .unwrap_or(Err(ConciergeError::Timeout {
            duration: self.lookup_timeout,
        }));

        match result {
            Ok(owner) => owner,
            Err(e) => {
                warn!(
                    connection_id = %connection,
                    error = %e,
                    "failed to resolve business connection owner"
                );
                None
            }
        }
    }

    /// Forgets every connection owned by `user`. Returns the evicted ids.
    pub fn revoke(&mut self, user: UserId) -> Vec<ConnectionId> {
        let evicted: Vec<ConnectionId> = self
            .owner_of
            .iter()
            .filter(|(_, owner)| **owner == user)
            .map(|(connection, _)| connection.clone())
            .collect();

        for connection in &evicted {
            self.owner_of.remove(connection);
            self.states.remove(connection);
        }
        if !evicted.is_empty() {
            info!(user_id = %user, count = evicted.len(), "revoked business connection trust");
        }
        evicted
    }
}
