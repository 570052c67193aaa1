//! Conversation context management.
//!
//! One [`ConversationContext`] per session: the ordered turn history,
//! scratch slots for identifiers picked up along the way, and timestamps.
//! [`ContextStore`] owns them, keyed by session id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use partdesk_core::{Role, Turn};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ChatError;

/// Slot holding the most recently extracted part number.
pub const SLOT_PART_ID: &str = "part_id";
/// Slot holding the most recently extracted model number.
pub const SLOT_MODEL_ID: &str = "model_id";

// =============================================================================
// ConversationContext
// =============================================================================

/// State of a single conversation.
///
/// Turns are append-only; the only way to drop them is [`clear`](Self::clear).
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    session_id: String,
    turns: Vec<Turn>,
    slots: HashMap<String, String>,
    started_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            slots: HashMap::new(),
            started_at: now,
            last_message_at: now,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_message_at(&self) -> DateTime<Utc> {
        self.last_message_at
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Turn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Turn::assistant(text));
    }

    fn push(&mut self, turn: Turn) {
        self.last_message_at = Utc::now();
        self.turns.push(turn);
    }

    /// The text identifiers are extracted from: every turn in order,
    /// newline-joined. Assistant turns are skipped unless `include_assistant`.
    pub fn window_text(&self, include_assistant: bool) -> String {
        self.turns
            .iter()
            .filter(|t| include_assistant || t.role == Role::User)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    pub fn set_slot(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(key.into(), value.into());
    }

    pub fn slots(&self) -> &HashMap<String, String> {
        &self.slots
    }

    /// Drop all turns and slots and restart the clock. The session id stays.
    pub fn clear(&mut self) {
        let now = Utc::now();
        self.turns.clear();
        self.slots.clear();
        self.started_at = now;
        self.last_message_at = now;
    }
}

// =============================================================================
// ContextStore
// =============================================================================

/// All live conversations, keyed by session id.
///
/// Callers serialize requests per session; the store itself does no locking.
#[derive(Debug, Default)]
pub struct ContextStore {
    sessions: HashMap<String, ConversationContext>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new empty session under a fresh random id.
    pub fn create_session(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .insert(id.clone(), ConversationContext::new(id.clone()));
        tracing::debug!(session = %id, "Session created");
        id
    }

    /// The session's context, created empty on first use.
    pub fn session_mut(&mut self, session_id: &str) -> &mut ConversationContext {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationContext::new(session_id))
    }

    pub fn get(&self, session_id: &str) -> Option<&ConversationContext> {
        self.sessions.get(session_id)
    }

    /// Turn history of an existing session.
    pub fn history(&self, session_id: &str) -> Result<&[Turn], ChatError> {
        self.sessions
            .get(session_id)
            .map(ConversationContext::turns)
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    /// Clear a session's history and slots. Returns whether it existed.
    pub fn reset(&mut self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(context) => {
                context.clear();
                tracing::info!(session = %session_id, "Session reset");
                true
            }
            None => false,
        }
    }

    /// Known session ids, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
