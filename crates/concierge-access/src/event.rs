// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalizes business-connection authorization payloads.
//!
//! Upstream payloads have carried the connection id and the owning user under
//! several field names. They are probed once here; anything that still lacks
//! either field is rejected with [`ConciergeError::UnrecognizedEvent`].

use concierge_core::{ConciergeError, ConnectionId, UserId};
use serde_json::Value;

const CONNECTION_ID_FIELDS: &[&str] = &["id", "business_connection_id", "connection_id"];
const USER_ID_FIELDS: &[&str] = &["user_id", "owner_id"];

/// A business account linked (or re-linked) the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConnectionEvent {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
}

impl BusinessConnectionEvent {
    pub fn from_value(value: &Value) -> Result<Self, ConciergeError> {
        let connection_id = CONNECTION_ID_FIELDS
            .iter()
            .find_map(|field| value.get(field)?.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ConciergeError::UnrecognizedEvent(format!("business connection without id: {value}"))
            })?;

        let user_id = value
            .get("user")
            .and_then(|user| user.get("id"))
            .and_then(Value::as_u64)
            .or_else(|| {
                USER_ID_FIELDS
                    .iter()
                    .find_map(|field| value.get(field)?.as_u64())
            })
            .filter(|&id| id != 0)
            .ok_or_else(|| {
                ConciergeError::UnrecognizedEvent(format!(
                    "business connection without user id: {value}"
                ))
            })?;

        Ok(Self {
            connection_id: ConnectionId::from(connection_id),
            user_id: UserId(user_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bot_api_shape() {
        let event = BusinessConnectionEvent::from_value(&json!({
            "id": "conn-1",
            "user": {"id": 42, "is_bot": false, "first_name": "Olga"},
            "user_chat_id": 42,
            "date": 1700000000,
            "is_enabled": true
        }))
        .unwrap();
        assert_eq!(event.connection_id.as_str(), "conn-1");
        assert_eq!(event.user_id, UserId(42));
    }

    #[test]
    fn flat_alternative_fields() {
        let event = BusinessConnectionEvent::from_value(&json!({
            "business_connection_id": "conn-2",
            "owner_id": 7
        }))
        .unwrap();
        assert_eq!(event.connection_id.as_str(), "conn-2");
        assert_eq!(event.user_id, UserId(7));
    }

    #[test]
    fn missing_fields_are_unrecognized() {
        let err = BusinessConnectionEvent::from_value(&json!({"user_id": 7})).unwrap_err();
        assert!(matches!(err, ConciergeError::UnrecognizedEvent(_)));

        let err = BusinessConnectionEvent::from_value(&json!({"id": "c"})).unwrap_err();
        assert!(err.to_string().contains("without user id"));
    }
}
