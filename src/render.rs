//! Transcript rendering
//!
//! A pure read of session state into the view the page displays.

use crate::state_machine::{ChatPhase, Conversation, InputMethod, SessionContext, SessionState, Turn};
use serde::Serialize;
use std::time::Duration;

pub const PAGE_TITLE: &str = "AI ChatBot";
pub const HEADING: &str = "Chatbot Assistant";
pub const DESCRIPTION: &str = "Interact with the chatbot using text or speech input.";

/// A turn prepared for display
#[derive(Debug, Clone, Serialize)]
pub struct RenderedTurn {
    pub role: &'static str,
    pub text: String,
    pub is_user: bool,
    /// Plain form, e.g. `User: Hello`
    pub line: String,
    /// Markdown form, e.g. `**User:** Hello`
    pub markdown: String,
}

impl From<&Turn> for RenderedTurn {
    fn from(turn: &Turn) -> Self {
        let role = turn.role_label();
        Self {
            role,
            text: turn.text.clone(),
            is_user: turn.is_user,
            line: format!("{role}: {}", turn.text),
            markdown: format!("**{role}:** {}", turn.text),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMethodOption {
    pub id: InputMethod,
    pub label: &'static str,
}

pub fn input_method_options() -> Vec<InputMethodOption> {
    InputMethod::ALL
        .iter()
        .map(|&id| InputMethodOption {
            id,
            label: id.label(),
        })
        .collect()
}

/// Everything the page shows for one session
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    pub session_id: String,
    pub title: &'static str,
    pub heading: &'static str,
    pub description: &'static str,
    pub input_methods: Vec<InputMethodOption>,
    pub input_method: InputMethod,
    pub phase: ChatPhase,
    pub pending_input: String,
    /// Send is only offered when something is staged
    pub can_send: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub you_said: Option<String>,
    pub turns: Vec<RenderedTurn>,
    /// Whole transcript as markdown
    pub markdown: String,
}

impl TranscriptView {
    /// Transcript as plain `Role: text` lines
    #[cfg(test)]
    pub fn lines(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.line.as_str()).collect()
    }
}

pub fn listening_hint(window: Duration) -> String {
    format!(
        "Listening... Please speak for up to {} seconds.",
        window.as_secs()
    )
}

/// Walk the conversation in order, one markdown line per turn
pub fn render_markdown(conversation: &Conversation) -> String {
    conversation
        .turns()
        .iter()
        .map(|t| RenderedTurn::from(t).markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render(context: &SessionContext, state: &SessionState) -> TranscriptView {
    let speech_mode = state.input_method == InputMethod::Speech;

    TranscriptView {
        session_id: context.session_id.clone(),
        title: PAGE_TITLE,
        heading: HEADING,
        description: DESCRIPTION,
        input_methods: input_method_options(),
        input_method: state.input_method,
        phase: state.phase,
        pending_input: state.pending_input.as_str().to_string(),
        can_send: !state.pending_input.is_empty() && !state.phase.is_busy(),
        listening_hint: speech_mode.then(|| listening_hint(context.record_window)),
        you_said: if speech_mode {
            state.last_transcription.clone()
        } else {
            None
        },
        turns: state
            .conversation
            .turns()
            .iter()
            .map(RenderedTurn::from)
            .collect(),
        markdown: render_markdown(&state.conversation),
    }
}
