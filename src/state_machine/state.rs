//! Session state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Conversation
// ============================================================================

/// One message in the transcript. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub text: String,
    pub is_user: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            created_at: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            created_at: Utc::now(),
        }
    }

    /// Label shown in front of the turn when rendered
    pub fn role_label(&self) -> &'static str {
        if self.is_user {
            "User"
        } else {
            "Chatbot"
        }
    }
}

/// Ordered, append-only log of turns for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a user turn and the reply to it, in that order
    pub(crate) fn push_exchange(&mut self, user: Turn, reply: Turn) {
        debug_assert!(user.is_user && !reply.is_user);
        self.turns.push(user);
        self.turns.push(reply);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

// ============================================================================
// Pending input
// ============================================================================

/// The message staged for sending. Overwritten by each input method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PendingInput(String);

impl PendingInput {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, text: impl Into<String>) {
        self.0 = text.into();
    }

    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

// ============================================================================
// Input method and phase
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMethod {
    #[default]
    Text,
    Speech,
}

impl InputMethod {
    pub const ALL: [InputMethod; 2] = [InputMethod::Text, InputMethod::Speech];

    pub fn label(self) -> &'static str {
        match self {
            InputMethod::Text => "📃 Text Input",
            InputMethod::Speech => "🎤 Speech Input",
        }
    }
}

/// Where the session is in the input → send → render cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    /// Nothing staged
    #[default]
    AwaitingInput,
    /// Pending input is non-empty and can be sent
    InputCaptured,
    /// A speech clip is being captured or recognized
    Listening,
    /// Waiting on the text generator
    Generating,
}

impl ChatPhase {
    /// Resting phase for the given pending input
    pub fn settled(pending: &PendingInput) -> Self {
        if pending.is_empty() {
            ChatPhase::AwaitingInput
        } else {
            ChatPhase::InputCaptured
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, ChatPhase::Listening | ChatPhase::Generating)
    }
}

// ============================================================================
// Session state and context
// ============================================================================

/// Mutable state of one browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub conversation: Conversation,
    pub pending_input: PendingInput,
    pub input_method: InputMethod,
    pub phase: ChatPhase,
    /// Text of the most recent speech capture, echoed back as "You said: ..."
    pub last_transcription: Option<String>,
}

/// Immutable configuration of one session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub record_window: Duration,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, record_window: Duration) -> Self {
        Self {
            session_id: session_id.into(),
            record_window,
        }
    }
}
