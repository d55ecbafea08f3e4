// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram business-account transport.
//!
//! Implements [`ChannelTransport`] over the Telegram Bot API via teloxide:
//! long polling for business and direct updates, replies through a business
//! connection, owner lookups, and HTML alerts to owners and admins.

pub mod handler;

use async_trait::async_trait;
use concierge_config::model::TelegramConfig;
use concierge_core::{
    AdapterType, ChannelTransport, ConciergeError, ConnectionId, HealthStatus, MessageId,
    Notifier, OutboundMessage, OwnerResolver, PluginAdapter, TransportEvent, UserId,
};
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, BusinessConnectionId, ParseMode, ReplyParameters};
use teloxide::update_listeners::Polling;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Environment variable consulted when the config carries no token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Update kinds requested from the Bot API.
fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![
        AllowedUpdate::Message,
        AllowedUpdate::BusinessMessage,
        AllowedUpdate::EditedBusinessMessage,
        AllowedUpdate::DeletedBusinessMessages,
        AllowedUpdate::BusinessConnection,
    ]
}

/// Telegram transport implementing [`ChannelTransport`].
pub struct TelegramTransport {
    bot: Bot,
    events_rx: tokio::sync::Mutex<mpsc::Receiver<TransportEvent>>,
    events_tx: mpsc::Sender<TransportEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramTransport {
    /// Creates the transport. The token comes from the config or
    /// `TELEGRAM_BOT_TOKEN`; a missing or empty token is a config error.
    pub fn new(config: &TelegramConfig) -> Result<Self, ConciergeError> {
        let token = resolve_bot_token(&config.bot_token)?;
        let bot = Bot::new(token);
        let (events_tx, events_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            events_rx: tokio::sync::Mutex::new(events_rx),
            events_tx,
            polling_handle: None,
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// Resolves the bot token: config value first, then `TELEGRAM_BOT_TOKEN`.
pub fn resolve_bot_token(configured: &Option<String>) -> Result<String, ConciergeError> {
    let token = match configured {
        Some(token) => token.trim().to_string(),
        None => std::env::var(BOT_TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .unwrap_or_default(),
    };
    if token.is_empty() {
        return Err(ConciergeError::Config(format!(
            "telegram.bot_token is required (or set {BOT_TOKEN_ENV})"
        )));
    }
    Ok(token)
}

fn transport_err(context: &str, e: teloxide::RequestError) -> ConciergeError {
    ConciergeError::Transport {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        debug!("Telegram transport shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl OwnerResolver for TelegramTransport {
    async fn resolve_connection_owner(
        &self,
        connection: &ConnectionId,
    ) -> Result<Option<UserId>, ConciergeError> {
        let conn = self
            .bot
            .get_business_connection(BusinessConnectionId(connection.0.clone()))
            .await
            .map_err(|e| transport_err("failed to fetch business connection", e))?;
        Ok(Some(UserId(conn.user.id.0)))
    }
}

#[async_trait]
impl Notifier for TelegramTransport {
    async fn notify(&self, target: UserId, text: &str) -> Result<(), ConciergeError> {
        let chat = i64::try_from(target.0).map_err(|_| ConciergeError::Delivery {
            target: target.0,
            message: "user id out of chat id range".into(),
        })?;
        self.bot
            .send_message(ChatId(chat), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| ConciergeError::Delivery {
                target: target.0,
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ChannelTransport for TelegramTransport {
    async fn connect(&mut self) -> Result<(), ConciergeError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.events_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry().endpoint(move |update: Update| {
                let tx = tx.clone();
                async move {
                    if let Some(event) = handler::classify_update(update)
                        && tx.send(event).await.is_err()
                    {
                        warn!("event channel closed, dropping update");
                    }
                    respond(())
                }
            });

            let listener = Polling::builder(bot.clone())
                .allowed_updates(allowed_updates())
                .build();

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Telegram polling error"),
                )
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<TransportEvent, ConciergeError> {
        let mut rx = self.events_rx.lock().await;
        rx.recv().await.ok_or_else(|| ConciergeError::Transport {
            message: "Telegram event channel closed".into(),
            source: None,
        })
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ConciergeError> {
        let mut request = self.bot.send_message(ChatId(msg.chat_id.0), &msg.text);
        if let Some(connection) = &msg.connection_id {
            request = request.business_connection_id(BusinessConnectionId(connection.0.clone()));
        }
        if let Some(reply_to) = msg.reply_to {
            request = request.reply_parameters(ReplyParameters::new(
                teloxide::types::MessageId(reply_to),
            ));
        }

        let sent = request
            .await
            .map_err(|e| transport_err("failed to send message", e))?;
        Ok(MessageId(sent.id.0.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn configured_token_is_used() {
        let token = resolve_bot_token(&Some(" 123:abc ".into())).unwrap();
        assert_eq!(token, "123:abc");
    }

    #[test]
    fn empty_configured_token_is_rejected() {
        let err = resolve_bot_token(&Some("   ".into())).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
    }

    #[test]
    fn new_with_token_succeeds() {
        let transport = TelegramTransport::new(&config_with_token(Some("123:abc"))).unwrap();
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }

    #[test]
    fn new_with_empty_token_fails() {
        assert!(TelegramTransport::new(&config_with_token(Some(""))).is_err());
    }

    #[test]
    fn business_updates_are_requested() {
        let updates = allowed_updates();
        assert!(updates.contains(&AllowedUpdate::BusinessMessage));
        assert!(updates.contains(&AllowedUpdate::BusinessConnection));
        assert!(updates.contains(&AllowedUpdate::Message));
    }

    #[tokio::test]
    async fn receive_returns_queued_events() {
        let transport = TelegramTransport::new(&config_with_token(Some("123:abc"))).unwrap();
        let event = TransportEvent::Deleted {
            chat_id: concierge_core::ChatId(5),
            message_ids: vec![1, 2],
        };
        transport.events_tx.send(event.clone()).await.unwrap();
        assert_eq!(transport.receive().await.unwrap(), event);
    }

    #[tokio::test]
    async fn unreachable_api_is_unhealthy() {
        let mut transport = TelegramTransport::new(&config_with_token(Some("123:abc"))).unwrap();
        transport.bot = transport
            .bot
            .clone()
            .set_api_url("http://127.0.0.1:9/".parse().unwrap());
        let status = transport.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(reason) if reason.contains("unreachable")));
    }
}
