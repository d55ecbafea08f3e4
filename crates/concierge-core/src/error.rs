// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the concierge workspace.

use thiserror::Error;

/// The primary error type used across all collaborator traits and core operations.
///
/// Every variant degrades to silence or a fallback reply at the agent loop;
/// none of them is allowed to stop message processing for other chats.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Missing or invalid configuration (credentials, labels, paths).
    #[error("configuration error: {0}")]
    Config(String),

    /// The language-model backend rejected the request or returned nothing usable.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bounded network call did not finish in time.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The bot transport rejected a call (send, lookup, polling).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single staff notification target could not be reached.
    #[error("delivery to {target} failed: {message}")]
    Delivery { target: u64, message: String },

    /// An upstream event payload did not carry the fields we need.
    #[error("unrecognized event shape: {0}")]
    UnrecognizedEvent(String),

    /// Admin store errors (connection, migration, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Returns `true` when the error came from a timed-out upstream call.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConciergeError::Timeout { .. })
    }
}
