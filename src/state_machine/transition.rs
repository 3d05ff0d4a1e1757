//! Pure state transition function
//!
//! Every user action maps to `(state, event) -> new state + effects`.
//! No I/O happens here; the runtime performs the effects.

use super::state::{ChatPhase, InputMethod, SessionContext, SessionState, Turn};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session is busy, wait for the current action to finish")]
    Busy,
    #[error("{0} is not available in the current input mode")]
    WrongInputMethod(&'static str),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Speech completion
        // ============================================================

        (ChatPhase::Listening, Event::SpeechCaptured { transcription }) => {
            let text = transcription.into_text();
            let mut next = state.clone();
            next.pending_input.set(text.clone());
            next.last_transcription = Some(text);
            next.phase = ChatPhase::settled(&next.pending_input);
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        // Cancelled or no audio: back to where we were, pending input untouched
        (ChatPhase::Listening, Event::RecordingCancelled) => {
            let mut next = state.clone();
            next.phase = ChatPhase::settled(&next.pending_input);
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        // ============================================================
        // Generation completion
        // ============================================================

        (ChatPhase::Generating, Event::ResponseGenerated { text }) => {
            let mut next = state.clone();
            let input = next.pending_input.take();
            next.conversation
                .push_exchange(Turn::user(input), Turn::bot(text));
            next.phase = ChatPhase::AwaitingInput;
            next.last_transcription = None;
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        // Nothing is appended; the message stays staged for another send
        (ChatPhase::Generating, Event::GenerationFailed { .. }) => {
            let mut next = state.clone();
            next.phase = ChatPhase::settled(&next.pending_input);
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        // One action at a time
        (phase, _) if phase.is_busy() => Err(TransitionError::Busy),

        // ============================================================
        // User actions
        // ============================================================

        (_, Event::SelectInputMethod { method }) => {
            let mut next = state.clone();
            next.input_method = method;
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        (_, Event::TextEdited { .. }) if state.input_method != InputMethod::Text => {
            Err(TransitionError::WrongInputMethod("Text entry"))
        }

        (_, Event::TextEdited { text }) => {
            let mut next = state.clone();
            next.pending_input.set(text);
            next.phase = ChatPhase::settled(&next.pending_input);
            next.last_transcription = None;
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        (_, Event::RecordingStarted) if state.input_method != InputMethod::Speech => {
            Err(TransitionError::WrongInputMethod("Recording"))
        }

        (_, Event::RecordingStarted) => {
            let mut next = state.clone();
            next.phase = ChatPhase::Listening;
            Ok(TransitionResult::new(next).with_effect(Effect::CaptureSpeech {
                window: context.record_window,
            }))
        }

        // Nothing staged: Send is a no-op
        (_, Event::Send) if state.pending_input.is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }

        (_, Event::Send) => {
            let mut next = state.clone();
            next.phase = ChatPhase::Generating;
            let input = next.pending_input.as_str().to_string();
            Ok(TransitionResult::new(next).with_effect(Effect::generate_response(input)))
        }

        (_, Event::Clear) => {
            let mut next = state.clone();
            next.conversation.clear();
            next.last_transcription = None;
            Ok(TransitionResult::new(next).with_effect(Effect::Reload))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================

        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {phase:?} with event {event:?}"
        ))),
    }
}
