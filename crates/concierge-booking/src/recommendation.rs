// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks a promotional add-on for the master the customer is talking about.
//!
//! The subject is taken from the new message first, then from the most recent
//! assistant turn whose status block names a master. Once a recommendation is
//! chosen for a subject it is reused for as long as the subject stays the same,
//! so the customer never sees the discount change mid-conversation.

use concierge_core::{Role, Turn};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{RecommendationCatalog, normalize};
use crate::status::StatusBlockCodec;

/// Subject key used for "any master".
pub const ANY_SUBJECT_KEY: &str = "any";

/// A selected offer, ready to be shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Normalized master name, or [`ANY_SUBJECT_KEY`].
    pub subject_key: String,
    /// How the subject is named in the paragraph.
    pub subject_label: String,
    pub title: String,
    pub discount_percent: u8,
    pub description: String,
}

impl Recommendation {
    pub fn is_any(&self) -> bool {
        self.subject_key == ANY_SUBJECT_KEY
    }

    /// The canonical single-line paragraph inserted into replies.
    pub fn paragraph(&self) -> String {
        let description = self.description.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.is_any() {
            format!(
                "Special offer for you: «{}» with a {}% discount. {}",
                self.title, self.discount_percent, description
            )
        } else {
            format!(
                "Special offer from {}: «{}» with a {}% discount. {}",
                self.subject_label, self.title, self.discount_percent, description
            )
        }
    }
}

/// Who the customer wants to book with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Specific(String),
    Any,
}

impl Subject {
    fn key(&self) -> String {
        match self {
            Subject::Specific(name) => normalize(name),
            Subject::Any => ANY_SUBJECT_KEY.to_string(),
        }
    }
}

/// Detects the subject and samples an offer for it.
#[derive(Debug, Clone)]
pub struct RecommendationSelector {
    catalog: RecommendationCatalog,
    codec: StatusBlockCodec,
    any_phrases: Vec<String>,
    any_label: String,
}

impl RecommendationSelector {
    pub fn new(
        catalog: RecommendationCatalog,
        codec: StatusBlockCodec,
        any_phrases: &[String],
        any_label: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            codec,
            any_phrases: any_phrases.iter().map(|p| normalize(p)).collect(),
            any_label: any_label.into(),
        }
    }

    pub fn catalog(&self) -> &RecommendationCatalog {
        &self.catalog
    }

    /// Returns the recommendation for this turn, or `None` when no subject is
    /// known or the catalog has nothing for it.
    ///
    /// `rng` is the only source of non-determinism.
    pub fn select<R: Rng + ?Sized>(
        &self,
        input: &str,
        history: &[Turn],
        previous: Option<&Recommendation>,
        rng: &mut R,
    ) -> Option<Recommendation> {
        let subject = self.detect_subject(input, history)?;

        if let Some(previous) = previous
            && previous.subject_key == subject.key()
        {
            return Some(previous.clone());
        }

        let offers = match &subject {
            Subject::Specific(name) => self.catalog.offers_for(name)?.to_vec(),
            Subject::Any => self.catalog.all_offers(),
        };
        let picked = offers.choose(rng)?;
        let Some(description) = self.catalog.description(&picked.title) else {
            debug!(title = picked.title.as_str(), "offer has no description, skipping");
            return None;
        };

        let subject_label = match &subject {
            Subject::Specific(name) => name.clone(),
            Subject::Any => self.any_label.clone(),
        };
        debug!(
            subject = subject_label.as_str(),
            title = picked.title.as_str(),
            "selected recommendation"
        );

        Some(Recommendation {
            subject_key: subject.key(),
            subject_label,
            title: picked.title.clone(),
            discount_percent: picked.discount,
            description: description.to_string(),
        })
    }

    /// Subject from the new input, else from history (most recent first).
    pub fn detect_subject(&self, input: &str, history: &[Turn]) -> Option<Subject> {
        if let Some(subject) = self.match_input(input) {
            return Some(subject);
        }

        history
            .iter()
            .rev()
            .filter(|turn| turn.role == Role::Assistant)
            .find_map(|turn| {
                let status = self.codec.parse(&turn.text)?;
                let master = status.master_if_known()?;
                Some(self.classify_master(master))
            })
    }

    fn match_input(&self, input: &str) -> Option<Subject> {
        let lower = normalize(input);
        if lower.is_empty() {
            return None;
        }
        if self.is_any(&lower) {
            return Some(Subject::Any);
        }
        self.catalog
            .subjects()
            .iter()
            .find(|subject| lower.contains(subject.key()))
            .map(|subject| Subject::Specific(subject.name.clone()))
    }

    fn classify_master(&self, value: &str) -> Subject {
        if self.is_any(&normalize(value)) {
            Subject::Any
        } else {
            // Canonical casing when the master is in the catalog.
            let name = self
                .catalog
                .subjects()
                .iter()
                .find(|s| s.key() == normalize(value))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| value.trim().to_string());
            Subject::Specific(name)
        }
    }

    /// Whole-text match against the "any master" phrases.
    fn is_any(&self, normalized: &str) -> bool {
        self.any_phrases.iter().any(|p| p == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn selector() -> RecommendationSelector {
        let catalog = RecommendationCatalog::from_json(
            r#"{
                "subjects": [
                    {"name": "Anna", "offers": [
                        {"title": "Gloss", "discount": 15},
                        {"title": "Color", "discount": 10},
                        {"title": "Curls", "discount": 5}
                    ]},
                    {"name": "Maria", "offers": [{"title": "Spa Hands", "discount": 20}]},
                    {"name": "Olga", "offers": [{"title": "Mystery", "discount": 30}]}
                ],
                "descriptions": [
                    {"title": "Gloss", "description": "Shine treatment."},
                    {"title": "Color", "description": "Root touch-up."},
                    {"title": "Curls", "description": "Soft waves."},
                    {"title": "Spa Hands", "description": "Paraffin wrap."}
                ]
            }"#,
        )
        .unwrap();
        RecommendationSelector::new(
            catalog,
            StatusBlockCodec::default(),
            &["any".to_string(), "no preference".to_string()],
            "any master",
        )
    }

    #[test]
    fn detects_named_master_in_input() {
        let subject = selector().detect_subject("Can I book with anna tomorrow?", &[]);
        assert_eq!(subject, Some(Subject::Specific("Anna".into())));
    }

    #[test]
    fn any_phrase_must_match_whole_message() {
        assert_eq!(selector().detect_subject("  No Preference ", &[]), Some(Subject::Any));
        assert_eq!(selector().detect_subject("anything works", &[]), None);
    }

    #[test]
    fn falls_back_to_most_recent_assistant_status() {
        let history = vec![
            Turn::assistant("Service: Haircut\nMaster: Anna\nTime: ?"),
            Turn::user("maybe someone else"),
            Turn::assistant("Service: Haircut\nMaster: Maria\nTime: ?"),
            Turn::assistant("Service: Haircut\nMaster: ?\nTime: ?"),
            Turn::user("Master: Olga"),
        ];
        let subject = selector().detect_subject("what time is free?", &history);
        assert_eq!(subject, Some(Subject::Specific("Maria".into())));
    }

    #[test]
    fn wildcard_master_in_history_means_any() {
        let history = vec![Turn::assistant("Service: Nails\nMaster: no preference\nTime: 12:00")];
        assert_eq!(selector().detect_subject("ok", &history), Some(Subject::Any));
    }

    #[test]
    fn same_subject_returns_previous_selection() {
        let selector = selector();
        let mut rng = StdRng::seed_from_u64(7);
        let first = selector.select("Anna please", &[], None, &mut rng).unwrap();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let again = selector
                .select("with Anna", &[], Some(&first), &mut rng)
                .unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn subject_change_resamples() {
        let selector = selector();
        let mut rng = StdRng::seed_from_u64(1);
        let anna = selector.select("Anna", &[], None, &mut rng).unwrap();
        let maria = selector.select("Maria", &[], Some(&anna), &mut rng).unwrap();
        assert_eq!(maria.subject_key, "maria");
        assert_eq!(maria.title, "Spa Hands");
        assert_eq!(maria.discount_percent, 20);
    }

    #[test]
    fn any_draws_from_all_offers() {
        let selector = selector();
        let mut rng = StdRng::seed_from_u64(3);
        let rec = selector.select("any", &[], None, &mut rng).unwrap();
        assert!(rec.is_any());
        assert_eq!(rec.subject_label, "any master");
        assert!(["Gloss", "Color", "Curls", "Spa Hands"].contains(&rec.title.as_str()));
    }

    #[test]
    fn no_subject_or_missing_description_yields_none() {
        let selector = selector();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(selector.select("hello", &[], None, &mut rng).is_none());
        assert!(selector.select("Olga", &[], None, &mut rng).is_none());
    }

    #[test]
    fn same_seed_same_choice() {
        let selector = selector();
        let a = selector.select("Anna", &[], None, &mut StdRng::seed_from_u64(42));
        let b = selector.select("Anna", &[], None, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn paragraph_names_subject() {
        let rec = Recommendation {
            subject_key: "anna".into(),
            subject_label: "Anna".into(),
            title: "Gloss".into(),
            discount_percent: 15,
            description: "Shine\n treatment.".into(),
        };
        assert_eq!(
            rec.paragraph(),
            "Special offer from Anna: «Gloss» with a 15% discount. Shine treatment."
        );
    }
}
