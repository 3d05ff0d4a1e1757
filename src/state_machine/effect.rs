//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record a clip of at most `window` and transcribe it
    CaptureSpeech { window: Duration },

    /// Ask the generator for a reply to `input`
    GenerateResponse { input: String },

    /// Re-render the transcript from current state
    Render,

    /// Client must reload its full view of the session
    Reload,
}

impl Effect {
    pub fn generate_response(input: impl Into<String>) -> Self {
        Effect::GenerateResponse {
            input: input.into(),
        }
    }
}
