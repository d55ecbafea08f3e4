// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! Clones share state, so a test can hand one clone to the agent loop and
//! keep another for assertions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use concierge_core::{
    AdapterType, ChannelTransport, ConciergeError, ConnectionId, HealthStatus, MessageId,
    Notifier, OutboundMessage, OwnerResolver, PluginAdapter, TransportEvent, UserId,
};

#[derive(Clone, Default)]
pub struct MockTransport {
    events: Arc<Mutex<VecDeque<TransportEvent>>>,
    notify: Arc<Notify>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    notifications: Arc<Mutex<Vec<(UserId, String)>>>,
    owners: Arc<Mutex<HashMap<ConnectionId, UserId>>>,
    failing_targets: Arc<Mutex<HashSet<UserId>>>,
    lookups: Arc<AtomicUsize>,
    lookups_fail: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for the next `receive()`.
    pub async fn inject(&self, event: TransportEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Makes `resolve_connection_owner(connection)` return `user`.
    pub async fn set_connection_owner(&self, connection: impl Into<String>, user: UserId) {
        self.owners
            .lock()
            .await
            .insert(ConnectionId(connection.into()), user);
    }

    /// Makes every owner lookup fail with a transport error.
    pub fn fail_owner_lookups(&self, fail: bool) {
        self.lookups_fail.store(fail, Ordering::SeqCst);
    }

    /// Makes notifications to `user` fail.
    pub async fn fail_notifications_to(&self, user: UserId) {
        self.failing_targets.lock().await.insert(user);
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Delivered alerts as `(target, text)`, in delivery order.
    pub async fn notifications(&self) -> Vec<(UserId, String)> {
        self.notifications.lock().await.clone()
    }

    pub fn owner_lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}

#[async_trait]
impl OwnerResolver for MockTransport {
    async fn resolve_connection_owner(
        &self,
        connection: &ConnectionId,
    ) -> Result<Option<UserId>, ConciergeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookups_fail.load(Ordering::SeqCst) {
            return Err(ConciergeError::Transport {
                message: "owner lookup failed".into(),
                source: None,
            });
        }
        Ok(self.owners.lock().await.get(connection).copied())
    }
}

#[async_trait]
impl Notifier for MockTransport {
    async fn notify(&self, target: UserId, text: &str) -> Result<(), ConciergeError> {
        if self.failing_targets.lock().await.contains(&target) {
            return Err(ConciergeError::Delivery {
                target: target.0,
                message: "blocked by user".into(),
            });
        }
        self.notifications
            .lock()
            .await
            .push((target, text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ChannelTransport for MockTransport {
    async fn connect(&mut self) -> Result<(), ConciergeError> {
        Ok(())
    }

    async fn receive(&self) -> Result<TransportEvent, ConciergeError> {
        loop {
            {
                let mut queue = self.events.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ConciergeError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }
}

#[cfg(test)]
mod tests {
    use concierge_core::ChatId;

    use super::*;

    #[tokio::test]
    async fn clones_share_captured_state() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        transport
            .send(OutboundMessage {
                chat_id: ChatId(1),
                text: "hi".into(),
                connection_id: None,
                reply_to: None,
            })
            .await
            .unwrap();
        assert_eq!(handle.sent_count().await, 1);
    }

    #[tokio::test]
    async fn receive_returns_injected_events() {
        let transport = MockTransport::new();
        let event = TransportEvent::Deleted {
            chat_id: ChatId(3),
            message_ids: vec![4],
        };
        transport.inject(event.clone()).await;
        assert_eq!(transport.receive().await.unwrap(), event);
    }

    #[tokio::test]
    async fn owner_lookups_are_scripted_and_counted() {
        let transport = MockTransport::new();
        transport.set_connection_owner("c1", UserId(9)).await;
        let owner = transport
            .resolve_connection_owner(&ConnectionId::from("c1"))
            .await
            .unwrap();
        assert_eq!(owner, Some(UserId(9)));

        transport.fail_owner_lookups(true);
        assert!(
            transport
                .resolve_connection_owner(&ConnectionId::from("c1"))
                .await
                .is_err()
        );
        assert_eq!(transport.owner_lookup_count(), 2);
    }

    #[tokio::test]
    async fn failing_targets_reject_notifications() {
        let transport = MockTransport::new();
        transport.fail_notifications_to(UserId(2)).await;
        assert!(transport.notify(UserId(1), "a").await.is_ok());
        assert!(transport.notify(UserId(2), "b").await.is_err());
        assert_eq!(transport.notifications().await, vec![(UserId(1), "a".to_string())]);
    }
}
