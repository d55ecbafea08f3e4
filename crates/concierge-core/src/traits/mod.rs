// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits. The booking engine only talks to the outside world
//! through these seams.

pub mod adapter;
pub mod admin;
pub mod provider;
pub mod transport;

pub use adapter::PluginAdapter;
pub use admin::AdminDirectory;
pub use provider::CompletionProvider;
pub use transport::{ChannelTransport, Notifier, OwnerResolver};
