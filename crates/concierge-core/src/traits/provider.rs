// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model completion collaborator.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// Produces free-form assistant text for a customer message.
///
/// Implementations must return an error (never hang, never panic) on timeout,
/// non-success status, or empty content. The caller turns every error into
/// "no reply".
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// Sends the request and returns the trimmed, non-empty completion text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ConciergeError>;
}
