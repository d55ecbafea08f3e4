// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff alerts for freshly completed booking drafts.

use std::time::Duration;

use concierge_core::{ConciergeError, Customer, Notifier, UserId};
use futures::future::join_all;
use tracing::{info, warn};

use crate::status::{BookingStatus, StatusBlockCodec};

/// A rendered staff alert (Telegram HTML).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub text: String,
    pub status: Option<BookingStatus>,
}

/// Outcome of a fan-out. Failures never propagate to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<UserId>,
    pub failed: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct NotificationRouter {
    codec: StatusBlockCodec,
    final_phrase: String,
    timeout: Duration,
}

impl NotificationRouter {
    pub fn new(codec: StatusBlockCodec, final_phrase: impl Into<String>, timeout: Duration) -> Self {
        let final_phrase = final_phrase.into();
        Self {
            codec: codec.with_trailer(final_phrase.clone()),
            final_phrase,
            timeout,
        }
    }

    /// True iff the processed reply carries the final phrase.
    pub fn should_notify(&self, processed_text: &str) -> bool {
        !self.final_phrase.is_empty() && processed_text.contains(&self.final_phrase)
    }

    /// Identity line, then the three status fields when a window is present.
    pub fn build_alert(&self, customer: &Customer, processed_text: &str) -> AlertPayload {
        let mut identity = format!(
            "Customer: <a href=\"tg://user?id={}\">{}</a>",
            customer.user_id,
            html_escape(&customer.display_name())
        );
        if let Some(username) = customer.username.as_deref().filter(|u| !u.is_empty()) {
            identity.push_str(&format!(" (@{})", html_escape(username)));
        }

        let status = self.codec.parse(processed_text);
        let text = match &status {
            Some(status) => {
                let labels = self.codec.labels();
                [
                    identity,
                    format!("{}: {}", html_escape(&labels.service), html_escape(&status.service)),
                    format!("{}: {}", html_escape(&labels.master), html_escape(&status.master)),
                    format!("{}: {}", html_escape(&labels.time), html_escape(&status.time)),
                ]
                .join("\n")
            }
            None => identity,
        };

        AlertPayload { text, status }
    }

    /// Delivers `alert` to every target concurrently, each bounded by the
    /// router timeout. A failed target is logged and skipped.
    pub async fn dispatch(
        &self,
        notifier: &dyn Notifier,
        targets: &[UserId],
        alert: &AlertPayload,
    ) -> DeliveryReport {
        let attempts = targets.iter().map(|&target| async move {
            let result = match tokio::time::timeout(self.timeout, notifier.notify(target, &alert.text))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ConciergeError::Timeout {
                    duration: self.timeout,
                }),
            };
            (target, result)
        });

        let mut report = DeliveryReport::default();
        for (target, result) in join_all(attempts).await {
            match result {
                Ok(()) => report.delivered.push(target),
                Err(e) => {
                    warn!(user_id = %target, error = %e, "staff notification failed");
                    report.failed.push(target);
                }
            }
        }
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "staff alert dispatched"
        );
        report
    }
}

/// Owners first, then admins, without duplicates.
pub fn targets(owners: &[UserId], admins: &[UserId]) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::with_capacity(owners.len() + admins.len());
    for &id in owners.iter().chain(admins) {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PHRASE: &str = "Passed to the administrator.";

    fn router() -> NotificationRouter {
        NotificationRouter::new(StatusBlockCodec::default(), PHRASE, Duration::from_millis(200))
    }

    fn customer() -> Customer {
        Customer {
            user_id: UserId(42),
            first_name: "Olga".into(),
            last_name: Some("<Petrova>".into()),
            username: Some("olga_p".into()),
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(UserId, String)>>,
        failing: Vec<UserId>,
        hanging: Vec<UserId>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, target: UserId, text: &str) -> Result<(), ConciergeError> {
            if self.hanging.contains(&target) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&target) {
                return Err(ConciergeError::Delivery {
                    target: target.0,
                    message: "blocked".into(),
                });
            }
            self.sent.lock().unwrap().push((target, text.to_string()));
            Ok(())
        }
    }

    #[test]
    fn should_notify_only_with_phrase() {
        assert!(router().should_notify(&format!("ok\n\n{PHRASE}")));
        assert!(!router().should_notify("ok"));
    }

    #[test]
    fn alert_contains_identity_and_fields() {
        let text = format!("Booked!\n\nService: Haircut\nMaster: Anna\nTime: 15:00\n\n{PHRASE}");
        let alert = router().build_alert(&customer(), &text);
        assert_eq!(
            alert.text,
            "Customer: <a href=\"tg://user?id=42\">Olga &lt;Petrova&gt;</a> (@olga_p)\n\
             Service: Haircut\nMaster: Anna\nTime: 15:00"
        );
        assert_eq!(alert.status.unwrap().time, "15:00");
    }

    #[test]
    fn alert_without_status_is_identity_only() {
        let alert = router().build_alert(&customer(), PHRASE);
        assert!(alert.status.is_none());
        assert_eq!(alert.text.lines().count(), 1);
        assert!(alert.text.starts_with("Customer: "));
    }

    #[test]
    fn identity_escapes_quotes() {
        let customer = Customer {
            user_id: UserId(7),
            first_name: "D'Arcy".into(),
            last_name: Some("\"Jo\"".into()),
            username: None,
        };
        let alert = router().build_alert(&customer, "no status");
        assert_eq!(
            alert.text,
            "Customer: <a href=\"tg://user?id=7\">D&#39;Arcy &quot;Jo&quot;</a>"
        );
    }

    #[test]
    fn targets_are_deduplicated_in_order() {
        let owners = [UserId(1), UserId(2)];
        let admins = [UserId(2), UserId(3), UserId(1)];
        assert_eq!(targets(&owners, &admins), vec![UserId(1), UserId(2), UserId(3)]);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_target() {
        let notifier = RecordingNotifier {
            failing: vec![UserId(2)],
            hanging: vec![UserId(3)],
            ..Default::default()
        };
        let alert = AlertPayload {
            text: "alert".into(),
            status: None,
        };
        let report = router()
            .dispatch(&notifier, &[UserId(1), UserId(2), UserId(3), UserId(4)], &alert)
            .await;

        assert_eq!(report.delivered, vec![UserId(1), UserId(4)]);
        assert_eq!(report.failed, vec![UserId(2), UserId(3)]);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }
}
