// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider for the concierge.
//!
//! Implements [`CompletionProvider`] on top of the Chat Completions API. The
//! caller supplies the system prompts and history; this crate only shapes the
//! request and turns every failure into an error.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::ProviderConfig;
use concierge_core::{
    AdapterType, CompletionProvider, CompletionRequest, ConciergeError, HealthStatus,
    PluginAdapter, Role,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

/// Chat-completions provider.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConciergeError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = config.model, endpoint = client.endpoint(), "OpenAI provider initialized");
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: OpenAiClient, config: &ProviderConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let messages = request
            .system
            .iter()
            .chain(&request.history)
            .map(|turn| ChatMessage {
                role: turn.role.to_string(),
                content: turn.text.clone(),
            })
            .chain(std::iter::once(ChatMessage {
                role: Role::User.to_string(),
                content: request.user_text.clone(),
            }))
            .collect();

        ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ConciergeError> {
        let chat_request = self.to_chat_request(&request);
        debug!(messages = chat_request.messages.len(), "sending completion request");
        let response = self.client.chat(&chat_request).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| ConciergeError::Provider {
                message: "completion returned no content".into(),
                source: None,
            })
    }
}

/// Resolves the API key from config, falling back to `OPENAI_API_KEY`.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, ConciergeError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            ConciergeError::Config(
                "OpenAI API key not found. Set provider.api_key in config or OPENAI_API_KEY environment variable.".into(),
            )
        })
}
