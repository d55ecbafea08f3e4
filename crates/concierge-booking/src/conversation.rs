// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat conversation state, held in memory for the life of the process.

use std::collections::HashMap;

use concierge_core::{ChatId, Turn};

use crate::recommendation::Recommendation;
use crate::status::BookingSignature;

/// What the engine remembers about one chat.
#[derive(Debug, Clone)]
pub struct ConversationState {
    chat_id: ChatId,
    window: usize,
    turns: Vec<Turn>,
    last_signature: Option<BookingSignature>,
    pending_recommendation: Option<Recommendation>,
}

impl ConversationState {
    pub fn new(chat_id: ChatId, window: usize) -> Self {
        Self {
            chat_id,
            window,
            turns: Vec::new(),
            last_signature: None,
            pending_recommendation: None,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Recent turns, oldest first. Never longer than the window.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Appends a user/assistant pair and evicts the oldest entries.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
        if self.turns.len() > self.window {
            let excess = self.turns.len() - self.window;
            self.turns.drain(..excess);
        }
    }

    pub fn last_signature(&self) -> Option<&BookingSignature> {
        self.last_signature.as_ref()
    }

    pub fn set_last_signature(&mut self, signature: BookingSignature) {
        self.last_signature = Some(signature);
    }

    pub fn pending_recommendation(&self) -> Option<&Recommendation> {
        self.pending_recommendation.as_ref()
    }

    pub fn set_pending_recommendation(&mut self, recommendation: Option<Recommendation>) {
        self.pending_recommendation = recommendation;
    }
}

/// Chat id → state. Owned by the agent loop and passed by reference.
#[derive(Debug)]
pub struct ConversationStore {
    window: usize,
    chats: HashMap<ChatId, ConversationState>,
}

impl ConversationStore {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            chats: HashMap::new(),
        }
    }

    /// State for `chat_id`, created on first use.
    pub fn entry(&mut self, chat_id: ChatId) -> &mut ConversationState {
        let window = self.window;
        self.chats
            .entry(chat_id)
            .or_insert_with(|| ConversationState::new(chat_id, window))
    }

    pub fn get(&self, chat_id: ChatId) -> Option<&ConversationState> {
        self.chats.get(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
