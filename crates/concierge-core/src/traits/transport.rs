// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot transport collaborator, split into the narrow seams the engine needs.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConnectionId, MessageId, OutboundMessage, TransportEvent, UserId};

/// Resolves which user owns a business connection.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    /// Returns the owning user, `Ok(None)` when the platform does not say.
    async fn resolve_connection_owner(
        &self,
        connection: &ConnectionId,
    ) -> Result<Option<UserId>, ConciergeError>;
}

/// Sends a staff-facing message to a single user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to `target`. A failure affects this target only.
    async fn notify(&self, target: UserId, text: &str) -> Result<(), ConciergeError>;
}

/// Full bidirectional transport used by the agent loop.
#[async_trait]
pub trait ChannelTransport: PluginAdapter + OwnerResolver + Notifier {
    /// Starts receiving updates from the platform.
    async fn connect(&mut self) -> Result<(), ConciergeError>;

    /// Waits for the next update.
    async fn receive(&self) -> Result<TransportEvent, ConciergeError>;

    /// Sends a reply.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ConciergeError>;
}
