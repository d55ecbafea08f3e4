// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a model draft into the reply that is actually sent.
//!
//! Steps, in order:
//! 1. Replace model-written upsell and promo paragraphs with the canonical
//!    recommendation paragraph (only when a recommendation was selected).
//! 2. Classify the status block against the chat's last signature.
//! 3. Keep the final phrase exactly once for a fresh complete status, remove
//!    it everywhere else.
//! 4. Collapse blank-line runs and trim trailing whitespace.

use tracing::debug;

use crate::conversation::ConversationState;
use crate::recommendation::Recommendation;
use crate::status::{BookingStatus, StatusBlockCodec};

/// How this turn's status relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    NoStatus,
    Incomplete,
    /// Complete, and the signature differs from the stored one (or none stored).
    NewComplete,
    /// Complete, with the same signature as the stored one.
    RepeatedComplete,
}

/// Result of [`ConversationPostProcessor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedReply {
    pub text: String,
    pub transition: StatusTransition,
    pub status: Option<BookingStatus>,
}

impl ProcessedReply {
    /// An empty reply must not be sent.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConversationPostProcessor {
    codec: StatusBlockCodec,
    final_phrase: String,
    upsell_triggers: Vec<String>,
    promo_triggers: Vec<String>,
}

impl ConversationPostProcessor {
    pub fn new(
        codec: StatusBlockCodec,
        final_phrase: impl Into<String>,
        upsell_triggers: &[String],
        promo_triggers: &[String],
    ) -> Self {
        let lowered = |triggers: &[String]| {
            triggers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        let final_phrase = final_phrase.into();
        Self {
            codec: codec.with_trailer(final_phrase.clone()),
            final_phrase,
            upsell_triggers: lowered(upsell_triggers),
            promo_triggers: lowered(promo_triggers),
        }
    }

    pub fn final_phrase(&self) -> &str {
        &self.final_phrase
    }

    /// Runs the full pipeline and updates the chat's stored signature.
    pub fn process(
        &self,
        draft: &str,
        state: &mut ConversationState,
        recommendation: Option<&Recommendation>,
    ) -> ProcessedReply {
        let mut text = draft.to_string();
        if let Some(recommendation) = recommendation {
            text = self.apply_recommendation(&text, &recommendation.paragraph());
        }

        let status = self.codec.parse(&text);
        let transition = classify(status.as_ref(), state);

        match transition {
            StatusTransition::NewComplete => {
                text = self.ensure_final_phrase(&text);
                if let Some(status) = &status {
                    debug!(
                        chat_id = %state.chat_id(),
                        signature = %status.signature(),
                        "new complete booking status"
                    );
                    state.set_last_signature(status.signature());
                }
            }
            StatusTransition::NoStatus
            | StatusTransition::Incomplete
            | StatusTransition::RepeatedComplete => {
                text = self.strip_final_phrase(&text);
            }
        }

        ProcessedReply {
            text: normalize_blank_lines(&text),
            transition,
            status,
        }
    }

    /// Drops trigger paragraphs, then inserts `canonical` before the status
    /// block (or at the end) unless it is already present.
    pub fn apply_recommendation(&self, text: &str, canonical: &str) -> String {
        let cleaned = self.remove_trigger_paragraphs(text, canonical);
        if cleaned.contains(canonical) {
            return cleaned;
        }

        let lines: Vec<&str> = cleaned.lines().collect();
        match self.codec.locate(&lines) {
            Some(start) => lines[..start]
                .iter()
                .copied()
                .chain(["", canonical, ""])
                .chain(lines[start..].iter().copied())
                .collect::<Vec<_>>()
                .join("\n"),
            None => format!("{}\n\n{canonical}", cleaned.trim_end()),
        }
    }

    /// Paragraphs are runs of lines bounded by blank lines or status lines, so
    /// the status block itself is never touched.
    fn remove_trigger_paragraphs(&self, text: &str, canonical: &str) -> String {
        let lines: Vec<&str> = text.lines().collect();
        let mut keep = vec![true; lines.len()];
        let is_boundary = |line: &str| line.trim().is_empty() || self.codec.is_status_line(line);

        let mut i = 0;
        while i < lines.len() {
            if is_boundary(lines[i]) {
                i += 1;
                continue;
            }
            let start = i;
            while i < lines.len() && !is_boundary(lines[i]) {
                i += 1;
            }

            let paragraph = lines[start..i]
                .iter()
                .map(|line| line.trim())
                .collect::<Vec<_>>()
                .join(" ");
            if paragraph == canonical
                || (!self.final_phrase.is_empty() && paragraph.contains(&self.final_phrase))
            {
                continue;
            }

            let lower = paragraph.to_lowercase();
            let triggered = self
                .upsell_triggers
                .iter()
                .chain(&self.promo_triggers)
                .any(|trigger| lower.contains(trigger.as_str()));
            if triggered {
                debug!(lines = i - start, "removing model-written offer paragraph");
                keep[start..i].fill(false);
            }
        }

        lines
            .iter()
            .zip(keep)
            .filter_map(|(line, keep)| keep.then_some(*line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends the phrase after a blank line when absent; keeps only the first
    /// occurrence when repeated.
    fn ensure_final_phrase(&self, text: &str) -> String {
        let phrase = self.final_phrase.as_str();
        if phrase.is_empty() {
            return text.to_string();
        }
        match text.find(phrase) {
            None => format!("{}\n\n{phrase}", text.trim_end()),
            Some(idx) => {
                let (head, tail) = text.split_at(idx + phrase.len());
                format!("{head}{}", tail.replace(phrase, ""))
            }
        }
    }

    fn strip_final_phrase(&self, text: &str) -> String {
        if self.final_phrase.is_empty() || !text.contains(&self.final_phrase) {
            return text.to_string();
        }
        debug!("stripping final phrase from reply without a fresh complete status");
        text.replace(&self.final_phrase, "")
    }
}

fn classify(status: Option<&BookingStatus>, state: &ConversationState) -> StatusTransition {
    match status {
        None => StatusTransition::NoStatus,
        Some(status) if !status.is_complete() => StatusTransition::Incomplete,
        Some(status) if state.last_signature() == Some(&status.signature()) => {
            StatusTransition::RepeatedComplete
        }
        Some(_) => StatusTransition::NewComplete,
    }
}

/// Collapses runs of blank lines to one, drops leading blank lines, and trims
/// trailing whitespace on every line and at the end.
pub fn normalize_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            if out.is_empty() || previous_blank {
                continue;
            }
            previous_blank = true;
        } else {
            previous_blank = false;
        }
        out.push(line);
    }
    out.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::ChatId;

    const PHRASE: &str = "Your request has been passed to the administrator.";

    fn processor() -> ConversationPostProcessor {
        ConversationPostProcessor::new(
            StatusBlockCodec::default(),
            PHRASE,
            &["we also offer".to_string(), "you might also like".to_string()],
            &["package".to_string(), "discount".to_string()],
        )
    }

    fn state() -> ConversationState {
        ConversationState::new(ChatId(1), 10)
    }

    fn recommendation() -> Recommendation {
        Recommendation {
            subject_key: "anna".into(),
            subject_label: "Anna".into(),
            title: "Gloss".into(),
            discount_percent: 15,
            description: "Shine treatment.".into(),
        }
    }

    #[test]
    fn new_complete_status_appends_phrase_once() {
        let mut state = state();
        let draft = "Booked!\n\nService: Haircut\nMaster: Anna\nTime: 15:00";
        let reply = processor().process(draft, &mut state, None);

        assert_eq!(reply.transition, StatusTransition::NewComplete);
        assert_eq!(
            reply.text,
            format!("Booked!\n\nService: Haircut\nMaster: Anna\nTime: 15:00\n\n{PHRASE}")
        );
        assert_eq!(state.last_signature().unwrap().as_str(), "Haircut||Anna||15:00");
    }

    #[test]
    fn repeated_signature_never_repeats_phrase() {
        let processor = processor();
        let mut state = state();
        let draft = format!("Booked!\nService: Haircut\nMaster: Anna\nTime: 15:00\n{PHRASE}");

        let first = processor.process(&draft, &mut state, None);
        assert_eq!(first.text.matches(PHRASE).count(), 1);

        let second = processor.process(&draft, &mut state, None);
        assert_eq!(second.transition, StatusTransition::RepeatedComplete);
        assert!(!second.text.contains(PHRASE));
    }

    #[test]
    fn changed_signature_is_new_again() {
        let processor = processor();
        let mut state = state();
        processor.process("Service: Haircut\nMaster: Anna\nTime: 15:00", &mut state, None);
        let reply = processor.process("Service: Haircut\nMaster: Anna\nTime: 16:00", &mut state, None);
        assert_eq!(reply.transition, StatusTransition::NewComplete);
        assert!(reply.text.ends_with(PHRASE));
    }

    #[test]
    fn incomplete_status_strips_hallucinated_phrase() {
        let mut state = state();
        let draft = format!("Almost there. {PHRASE}\n\nService: ?\nMaster: Anna\nTime: 15:00");
        let reply = processor().process(&draft, &mut state, None);

        assert_eq!(reply.transition, StatusTransition::Incomplete);
        assert_eq!(reply.text, "Almost there.\n\nService: ?\nMaster: Anna\nTime: 15:00");
        assert!(state.last_signature().is_none());
    }

    #[test]
    fn no_status_strips_phrase() {
        let mut state = state();
        let reply = processor().process(&format!("Hello!\n\n{PHRASE}"), &mut state, None);
        assert_eq!(reply.transition, StatusTransition::NoStatus);
        assert_eq!(reply.text, "Hello!");
    }

    #[test]
    fn status_lines_followed_by_prose_are_not_a_status() {
        let mut state = state();
        let draft = format!("Service: Haircut\nMaster: Anna\nTime: 15:00\n\nSee you! {PHRASE}");
        let reply = processor().process(&draft, &mut state, None);

        assert_eq!(reply.transition, StatusTransition::NoStatus);
        assert!(!reply.text.contains(PHRASE));
        assert!(state.last_signature().is_none());
    }

    #[test]
    fn duplicate_phrases_keep_first() {
        let mut state = state();
        let draft = format!("{PHRASE}\nService: A\nMaster: B\nTime: C\n{PHRASE}");
        let reply = processor().process(&draft, &mut state, None);
        assert_eq!(reply.text, format!("{PHRASE}\nService: A\nMaster: B\nTime: C"));
    }

    #[test]
    fn recommendation_replaces_offer_paragraphs_before_status() {
        let mut state = state();
        let draft = "Sure, Anna is free.\n\nWe also offer a relaxing massage.\n\nAsk about our spa package\nfor couples.\n\nService: Haircut\nMaster: Anna\nTime: ?";
        let rec = recommendation();
        let reply = processor().process(draft, &mut state, Some(&rec));

        assert_eq!(
            reply.text,
            format!(
                "Sure, Anna is free.\n\n{}\n\nService: Haircut\nMaster: Anna\nTime: ?",
                rec.paragraph()
            )
        );
    }

    #[test]
    fn recommendation_is_not_duplicated() {
        let mut state = state();
        let rec = recommendation();
        let draft = format!("Hi!\n\n{}\n\nService: ?\nMaster: Anna\nTime: ?", rec.paragraph());
        let reply = processor().process(&draft, &mut state, Some(&rec));
        assert_eq!(reply.text.matches(&rec.paragraph()).count(), 1);
    }

    #[test]
    fn recommendation_appended_without_status() {
        let mut state = state();
        let rec = recommendation();
        let reply = processor().process("Anna works on Mondays.", &mut state, Some(&rec));
        assert_eq!(reply.text, format!("Anna works on Mondays.\n\n{}", rec.paragraph()));
    }

    #[test]
    fn trigger_words_inside_status_block_are_kept() {
        let mut state = state();
        let rec = recommendation();
        let draft = "Noted.\nService: Discount package\nMaster: Anna\nTime: ?";
        let reply = processor().process(draft, &mut state, Some(&rec));
        assert!(reply.text.ends_with("Service: Discount package\nMaster: Anna\nTime: ?"));
        assert_eq!(reply.status.unwrap().service, "Discount package");
    }

    #[test]
    fn blank_line_runs_collapse() {
        assert_eq!(normalize_blank_lines("a\n\n\nb  \n\n\n\nc\n\n"), "a\n\nb\n\nc");
        assert_eq!(normalize_blank_lines("\n\n  \nx"), "x");
    }

    #[test]
    fn whitespace_only_draft_is_empty() {
        let mut state = state();
        let reply = processor().process(&format!("  \n{PHRASE}\n "), &mut state, None);
        assert!(reply.is_empty());
    }
}
