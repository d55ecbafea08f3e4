// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking conversation engine.
//!
//! Everything here is pure text and state manipulation except
//! [`NotificationRouter::dispatch`], which talks to a [`concierge_core::Notifier`].

pub mod catalog;
pub mod conversation;
pub mod notify;
pub mod postprocess;
pub mod recommendation;
pub mod status;

use std::path::Path;
use std::time::Duration;

use concierge_config::model::BookingConfig;
use concierge_core::ConciergeError;

pub use catalog::{Offer, RecommendationCatalog};
pub use conversation::{ConversationState, ConversationStore};
pub use notify::{AlertPayload, DeliveryReport, NotificationRouter};
pub use postprocess::{ConversationPostProcessor, ProcessedReply, StatusTransition};
pub use recommendation::{Recommendation, RecommendationSelector, Subject};
pub use status::{BookingSignature, BookingStatus, StatusBlockCodec, StatusLabels};

/// The booking components, built once from configuration.
#[derive(Debug, Clone)]
pub struct BookingEngine {
    pub codec: StatusBlockCodec,
    pub selector: RecommendationSelector,
    pub postprocessor: ConversationPostProcessor,
    pub router: NotificationRouter,
}

impl BookingEngine {
    /// Builds the engine. `notify_timeout` bounds each staff notification.
    pub fn from_config(
        config: &BookingConfig,
        notify_timeout: Duration,
    ) -> Result<Self, ConciergeError> {
        let catalog = match &config.catalog_path {
            Some(path) => RecommendationCatalog::load(Path::new(path))?,
            None => RecommendationCatalog::builtin()?,
        };
        Ok(Self::with_catalog(config, catalog, notify_timeout))
    }

    pub fn with_catalog(
        config: &BookingConfig,
        catalog: RecommendationCatalog,
        notify_timeout: Duration,
    ) -> Self {
        let codec = StatusBlockCodec::new(StatusLabels::new(
            config.service_label.clone(),
            config.master_label.clone(),
            config.time_label.clone(),
        ))
        .with_trailer(config.final_phrase.clone());
        Self {
            selector: RecommendationSelector::new(
                catalog,
                codec.clone(),
                &config.any_phrases,
                config.any_subject_label.clone(),
            ),
            postprocessor: ConversationPostProcessor::new(
                codec.clone(),
                config.final_phrase.clone(),
                &config.upsell_triggers,
                &config.promo_triggers,
            ),
            router: NotificationRouter::new(codec.clone(), config.final_phrase.clone(), notify_timeout),
            codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_uses_configured_labels() {
        let config = BookingConfig {
            service_label: "Услуга".into(),
            master_label: "Мастер".into(),
            time_label: "Время".into(),
            ..Default::default()
        };
        let engine = BookingEngine::from_config(&config, Duration::from_secs(1)).unwrap();
        let status = engine
            .codec
            .parse("Услуга: Стрижка\nМастер: Анна\nВремя: 15:00")
            .unwrap();
        assert!(status.is_complete());
    }

    #[test]
    fn missing_catalog_file_is_a_config_error() {
        let config = BookingConfig {
            catalog_path: Some("/nonexistent/catalog.json".into()),
            ..Default::default()
        };
        let err = BookingEngine::from_config(&config, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
    }
}
