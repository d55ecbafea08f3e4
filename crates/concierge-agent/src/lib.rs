// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event loop for the concierge.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives events from the transport
//! - Authorizes business connections before anything reaches the model
//! - Runs the per-turn pipeline (length guard, recommendation, completion,
//!   post-processing) and sends the reply
//! - Alerts owners and admins once per completed booking draft
//! - Executes owner commands in the direct bot chat
//! - Stops on cancellation

pub mod commands;
pub mod prompt;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use concierge_access::AccessControl;
use concierge_booking::{BookingEngine, ConversationStore, notify};
use concierge_config::model::ConciergeConfig;
use concierge_core::{
    ChannelTransport, ChatId, CompletionProvider, CompletionRequest, ConciergeError, Customer,
    InboundMessage, MessageOrigin, OutboundMessage, TransportEvent, Turn, UserId,
};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::OwnerCommand;

/// Per-turn limits taken from the configuration.
#[derive(Debug, Clone)]
struct TurnSettings {
    max_input_chars: usize,
    too_long_reply: String,
    request_delay: Duration,
}

/// Coordinates message flow between the transport, the model backend and
/// the booking engine.
pub struct AgentLoop {
    transport: Box<dyn ChannelTransport>,
    provider: Option<Arc<dyn CompletionProvider>>,
    access: AccessControl,
    engine: BookingEngine,
    conversations: ConversationStore,
    system: Vec<Turn>,
    settings: TurnSettings,
    rng: Box<dyn RngCore + Send>,
}

impl AgentLoop {
    /// Creates the loop. Without a provider, business messages get no
    /// model reply (the length guard still answers).
    pub fn new(
        transport: Box<dyn ChannelTransport>,
        provider: Option<Arc<dyn CompletionProvider>>,
        access: AccessControl,
        engine: BookingEngine,
        system: Vec<Turn>,
        config: &ConciergeConfig,
    ) -> Self {
        info!(
            agent_name = config.agent.name.as_str(),
            model_enabled = provider.is_some(),
            "agent loop initialized"
        );

        Self {
            transport,
            provider,
            access,
            engine,
            conversations: ConversationStore::new(config.agent.history_window),
            system,
            settings: TurnSettings {
                max_input_chars: config.agent.max_input_chars,
                too_long_reply: config.agent.too_long_reply.clone(),
                request_delay: Duration::from_millis(config.provider.request_delay_ms),
            },
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// Replaces the random source used for recommendation picks.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Runs until `cancel` fires or the transport closes. The message in
    /// progress is always finished before the loop exits.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ConciergeError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
                event = self.transport.receive() => {
                    match event {
                        Ok(event) => self.handle_event(event).await,
                        Err(e) => {
                            error!(error = %e, "transport receive error, stopping");
                            break;
                        }
                    }
                }
            }
        }

        self.transport.shutdown().await?;
        info!("agent loop stopped");
        Ok(())
    }

    /// Handles one transport event to completion. Never fails: every error
    /// is logged and the event is dropped.
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(inbound) => match inbound.origin {
                MessageOrigin::Business => self.handle_business(inbound).await,
                MessageOrigin::Direct => self.handle_direct(inbound).await,
            },
            TransportEvent::Connection(payload) => {
                match self.access.on_connection_event(&payload) {
                    Ok(decision) => debug!(?decision, "business connection event applied"),
                    Err(e) => warn!(error = %e, "ignoring business connection event"),
                }
            }
            TransportEvent::Edited(inbound) => {
                info!(
                    chat_id = %inbound.chat_id,
                    message_id = inbound.message_id,
                    "business message edited"
                );
            }
            TransportEvent::Deleted {
                chat_id,
                message_ids,
            } => {
                info!(%chat_id, ?message_ids, "business messages deleted");
            }
        }
    }

    async fn handle_business(&mut self, inbound: InboundMessage) {
        let chat_id = inbound.chat_id;
        let decision = self
            .access
            .authorize_business(inbound.connection_id.as_ref(), self.transport.as_ref())
            .await;
        if !decision.is_allowed() {
            info!(
                %chat_id,
                connection_id = ?inbound.connection_id,
                ?decision,
                "business message ignored: connection not trusted"
            );
            return;
        }

        if self.is_outgoing(&inbound) {
            debug!(%chat_id, "skipping message written by the business account");
            return;
        }

        let raw = inbound.text.as_deref().unwrap_or_default();
        let raw_chars = raw.chars().count();
        if raw_chars > self.settings.max_input_chars {
            info!(
                %chat_id,
                chars = raw_chars,
                "message too long, asking customer to shorten it"
            );
            let reply = self.settings.too_long_reply.clone();
            self.send(OutboundMessage::reply_to(&inbound, reply)).await;
            return;
        }

        let text = raw.trim();
        if text.is_empty() {
            debug!(%chat_id, "business message has no text");
            return;
        }
        let text = text.to_string();

        let Some(provider) = self.provider.clone() else {
            debug!(%chat_id, "no completion provider configured, not replying");
            return;
        };

        let (history, previous) = {
            let state = self.conversations.entry(chat_id);
            (
                state.turns().to_vec(),
                state.pending_recommendation().cloned(),
            )
        };
        let recommendation =
            self.engine
                .selector
                .select(&text, &history, previous.as_ref(), &mut *self.rng);
        if let Some(recommendation) = &recommendation {
            self.conversations
                .entry(chat_id)
                .set_pending_recommendation(Some(recommendation.clone()));
        }

        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }

        let request = CompletionRequest {
            system: self.system.clone(),
            history,
            user_text: text.clone(),
        };
        let draft = match provider.complete(request).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(%chat_id, error = %e, "completion failed, not replying");
                return;
            }
        };

        let state = self.conversations.entry(chat_id);
        let processed = self
            .engine
            .postprocessor
            .process(&draft, state, recommendation.as_ref());
        if processed.is_empty() {
            debug!(%chat_id, "processed reply is empty, not replying");
            return;
        }
        state.record_exchange(text, processed.text.clone());
        debug!(%chat_id, transition = ?processed.transition, "reply processed");

        self.send(OutboundMessage::reply_to(&inbound, processed.text.clone()))
            .await;

        if self.engine.router.should_notify(&processed.text) {
            self.alert_staff(&inbound, &processed.text).await;
        }
    }

    /// Business updates also carry what the account owner writes to customers.
    fn is_outgoing(&self, inbound: &InboundMessage) -> bool {
        let Some(sender) = inbound.sender.as_ref().map(|c| c.user_id) else {
            return false;
        };
        let connection_owner = inbound
            .connection_id
            .as_ref()
            .and_then(|c| self.access.trust().cached_owner(c));
        connection_owner == Some(sender) || self.access.trust().owners().contains(&sender)
    }

    async fn alert_staff(&self, inbound: &InboundMessage, processed_text: &str) {
        let Some(customer) = alert_customer(inbound) else {
            warn!(chat_id = %inbound.chat_id, "no customer identity for staff alert");
            return;
        };

        let admins = self.access.admin_snapshot().await;
        let targets = notify::targets(self.access.trust().owners(), &admins);
        if targets.is_empty() {
            warn!("booking completed but no owners or admins to notify");
            return;
        }

        let alert = self.engine.router.build_alert(&customer, processed_text);
        self.engine
            .router
            .dispatch(self.transport.as_ref(), &targets, &alert)
            .await;
    }

    async fn handle_direct(&mut self, inbound: InboundMessage) {
        let sender = inbound.sender.as_ref().map(|c| c.user_id);
        if !self.access.may_use_bot(sender).await {
            warn!(user_id = ?sender, "direct message ignored: not an owner or admin");
            return;
        }

        let Some(command) = inbound.text.as_deref().and_then(OwnerCommand::parse) else {
            debug!(chat_id = %inbound.chat_id, "direct message is not a command");
            return;
        };
        if !sender.is_some_and(|user| self.access.is_owner(user)) {
            debug!(user_id = ?sender, "owner command from non-owner ignored");
            return;
        }

        let reply = commands::execute(command, &mut self.access).await;
        self.send(OutboundMessage {
            chat_id: inbound.chat_id,
            text: reply,
            connection_id: None,
            reply_to: None,
        })
        .await;
    }

    async fn send(&self, msg: OutboundMessage) {
        let chat_id = msg.chat_id;
        if let Err(e) = self.transport.send(msg).await {
            error!(%chat_id, error = %e, "failed to send reply");
        }
    }
}

/// The sender, or the private chat's user when the sender is hidden.
fn alert_customer(inbound: &InboundMessage) -> Option<Customer> {
    if let Some(sender) = &inbound.sender {
        return Some(sender.clone());
    }
    let ChatId(id) = inbound.chat_id;
    u64::try_from(id).ok().map(|id| Customer {
        user_id: UserId(id),
        first_name: String::new(),
        last_name: None,
        username: None,
    })
}
