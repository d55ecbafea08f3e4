// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete [`AgentLoop`] with mock collaborators
//! and a temporary SQLite admin store, and drives it one event at a time.

use std::sync::Arc;
use std::time::Duration;

use concierge_access::{AccessControl, ConnectionTrustResolver};
use concierge_agent::AgentLoop;
use concierge_agent::prompt::system_turns;
use concierge_booking::BookingEngine;
use concierge_config::model::ConciergeConfig;
use concierge_core::{
    AdminDirectory, ChatId, CompletionProvider, ConciergeError, ConnectionId, Customer,
    InboundMessage, MessageOrigin, TransportEvent, UserId,
};
use concierge_storage::SqliteAdminStore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::mock_provider::MockProvider;
use crate::mock_transport::MockTransport;

/// Connection id used by [`TestHarness::customer_message`].
pub const CONNECTION: &str = "biz-1";
/// Customer (and chat) id used by [`TestHarness::customer_message`].
pub const CUSTOMER: u64 = 500;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    owners: Vec<u64>,
    admins: Vec<UserId>,
    strict: bool,
    seed: u64,
    config: ConciergeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            owners: Vec::new(),
            admins: Vec::new(),
            strict: true,
            seed: 7,
            config: ConciergeConfig::default(),
        }
    }

    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_owners(mut self, owners: Vec<u64>) -> Self {
        self.owners = owners;
        self
    }

    /// Admins present in the store before the loop starts.
    pub fn with_admins(mut self, admins: Vec<UserId>) -> Self {
        self.admins = admins;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Seed for the recommendation random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Starting configuration; owners and strictness still come from the builder.
    pub fn with_config(mut self, config: ConciergeConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ConciergeError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ConciergeError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("admins.db");
        let admins = Arc::new(SqliteAdminStore::open(&db_path.to_string_lossy()).await?);
        for admin in &self.admins {
            admins.add(*admin).await?;
        }

        let mut config = self.config;
        config.telegram.owner_ids = self.owners.clone();
        config.telegram.strict_business_connection = self.strict;

        let timeout = Duration::from_secs(1);
        let trust = ConnectionTrustResolver::new(
            self.owners.into_iter().map(UserId).collect(),
            self.strict,
            timeout,
        );
        let access = AccessControl::new(trust, admins.clone() as Arc<dyn AdminDirectory>);
        let engine = BookingEngine::from_config(&config.booking, timeout)?;
        let system = system_turns(
            "You are a test assistant.".to_string(),
            engine.codec.labels(),
            &config.booking.final_phrase,
        );

        let transport = MockTransport::new();
        let provider = Arc::new(MockProvider::with_responses(self.responses));

        let agent = AgentLoop::new(
            Box::new(transport.clone()),
            Some(provider.clone() as Arc<dyn CompletionProvider>),
            access,
            engine,
            system,
            &config,
        )
        .with_rng(StdRng::seed_from_u64(self.seed));

        Ok(TestHarness {
            agent,
            transport,
            provider,
            admins,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete agent over mock collaborators.
pub struct TestHarness {
    pub agent: AgentLoop,
    pub transport: MockTransport,
    pub provider: Arc<MockProvider>,
    /// SQLite admin store (temp DB, removed on drop).
    pub admins: Arc<SqliteAdminStore>,
    pub config: ConciergeConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends `text` from the default customer over the default connection
    /// and returns the reply, if one was sent.
    pub async fn customer_message(&mut self, text: &str) -> Option<String> {
        let event = business_message(CONNECTION, CUSTOMER, text);
        self.deliver(event).await
    }

    /// Sends `text` to the bot's direct chat from `from`.
    pub async fn direct_message(&mut self, from: u64, text: &str) -> Option<String> {
        let event = TransportEvent::Message(InboundMessage {
            message_id: 1,
            chat_id: ChatId(from as i64),
            origin: MessageOrigin::Direct,
            sender: Some(customer(from)),
            text: Some(text.to_string()),
            connection_id: None,
            timestamp: String::new(),
        });
        self.deliver(event).await
    }

    /// Feeds a raw business-connection payload to the loop.
    pub async fn connection_event(&mut self, payload: serde_json::Value) {
        self.agent
            .handle_event(TransportEvent::Connection(payload))
            .await;
    }

    /// Handles `event` and returns the text of the reply it produced.
    pub async fn deliver(&mut self, event: TransportEvent) -> Option<String> {
        let before = self.transport.sent_count().await;
        self.agent.handle_event(event).await;
        let sent = self.transport.sent_messages().await;
        if sent.len() > before {
            sent.last().map(|m| m.text.clone())
        } else {
            None
        }
    }
}

/// A business message from `customer_id` in their own chat on `connection`.
pub fn business_message(connection: &str, customer_id: u64, text: &str) -> TransportEvent {
    TransportEvent::Message(InboundMessage {
        message_id: 42,
        chat_id: ChatId(customer_id as i64),
        origin: MessageOrigin::Business,
        sender: Some(customer(customer_id)),
        text: Some(text.to_string()),
        connection_id: Some(ConnectionId::from(connection)),
        timestamp: String::new(),
    })
}

fn customer(id: u64) -> Customer {
    Customer {
        user_id: UserId(id),
        first_name: "Olga".to_string(),
        last_name: Some("Petrova".to_string()),
        username: Some("olga_p".to_string()),
    }
}
