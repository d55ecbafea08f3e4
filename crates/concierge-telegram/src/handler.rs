// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update classification and message conversion.
//!
//! Turns raw Telegram updates into transport-agnostic [`TransportEvent`]s.
//! Policy (who may be answered) lives in the agent, not here.

use concierge_core::{
    ChatId, ConnectionId, Customer, InboundMessage, MessageOrigin, TransportEvent, UserId,
};
use teloxide::types::{Message, MessageKind, Update, UpdateKind, User};
use tracing::{debug, warn};

/// Maps an update to an event, or `None` for update kinds we do not handle.
pub fn classify_update(update: Update) -> Option<TransportEvent> {
    match update.kind {
        UpdateKind::Message(msg) => Some(TransportEvent::Message(to_inbound_message(
            &msg,
            MessageOrigin::Direct,
        ))),
        UpdateKind::BusinessMessage(msg) => Some(TransportEvent::Message(to_inbound_message(
            &msg,
            MessageOrigin::Business,
        ))),
        UpdateKind::EditedBusinessMessage(msg) => Some(TransportEvent::Edited(
            to_inbound_message(&msg, MessageOrigin::Business),
        )),
        UpdateKind::DeletedBusinessMessages(deleted) => Some(TransportEvent::Deleted {
            chat_id: ChatId(deleted.chat.id.0),
            message_ids: deleted.message_ids.iter().map(|id| id.0).collect(),
        }),
        UpdateKind::BusinessConnection(connection) => match serde_json::to_value(&connection) {
            Ok(value) => Some(TransportEvent::Connection(value)),
            Err(e) => {
                warn!(error = %e, "failed to serialize business connection update");
                None
            }
        },
        other => {
            debug!(update_id = update.id.0, kind = ?other, "ignoring update");
            None
        }
    }
}

/// Converts a Telegram message into an [`InboundMessage`].
///
/// The caption stands in for the text on media messages.
pub fn to_inbound_message(msg: &Message, origin: MessageOrigin) -> InboundMessage {
    InboundMessage {
        message_id: msg.id.0,
        chat_id: ChatId(msg.chat.id.0),
        origin,
        sender: msg.from.as_ref().map(to_customer),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        connection_id: business_connection(msg),
        timestamp: chrono::DateTime::to_rfc3339(&msg.date),
    }
}

/// Only common (non-service) messages carry a business connection.
fn business_connection(msg: &Message) -> Option<ConnectionId> {
    match &msg.kind {
        MessageKind::Common(common) => common
            .business_connection_id
            .as_ref()
            .map(|id| ConnectionId(id.0.clone())),
        _ => None,
    }
}

fn to_customer(user: &User) -> Customer {
    Customer {
        user_id: UserId(user.id.0),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}
