// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the concierge booking assistant.
//!
//! Provides the error type, shared value types, and the collaborator traits
//! (model backend, bot transport, admin set) that every other crate builds on.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ConciergeError;
pub use types::{
    AdapterType, ChatId, CompletionRequest, ConnectionId, Customer, HealthStatus,
    InboundMessage, MessageId, MessageOrigin, OutboundMessage, Role, TransportEvent, Turn,
    UserId,
};

pub use traits::{
    AdminDirectory, ChannelTransport, CompletionProvider, Notifier, OwnerResolver,
    PluginAdapter,
};
