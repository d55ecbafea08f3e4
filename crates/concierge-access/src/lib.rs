// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access control for the concierge: who may use the bot directly and which
//! business connections may be answered.

pub mod admins;
pub mod control;
pub mod event;
pub mod trust;

pub use admins::MemoryAdminDirectory;
pub use control::AccessControl;
pub use event::BusinessConnectionEvent;
pub use trust::{AllowReason, ConnectionState, ConnectionTrustResolver, DenyReason, TrustDecision};
