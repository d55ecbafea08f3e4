// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin set collaborator.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::types::UserId;

/// A set of user ids granted admin rights by an owner.
///
/// Removal must be routed through `concierge_access::AccessControl` so that
/// cached connection trust is revoked in the same step.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Returns whether `user` is currently an admin.
    async fn contains(&self, user: UserId) -> Result<bool, ConciergeError>;

    /// Returns every admin, sorted ascending.
    async fn list(&self) -> Result<Vec<UserId>, ConciergeError>;

    /// Adds `user`. Idempotent: adding an existing admin succeeds.
    async fn add(&self, user: UserId) -> Result<(), ConciergeError>;

    /// Removes `user`, returning whether an entry was actually deleted.
    async fn remove(&self, user: UserId) -> Result<bool, ConciergeError>;
}
