//! API request and response types

use crate::render::TranscriptView;
use crate::state_machine::InputMethod;
use serde::{Deserialize, Serialize};

/// Request to switch between text and speech input
#[derive(Debug, Deserialize)]
pub struct SelectInputMethodRequest {
    pub method: InputMethod,
}

/// Request to replace the typed input
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: String,
}

/// Request to send; `text`, when present, replaces the pending input first
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// A recorded clip uploaded by the browser
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    /// Base64-encoded audio bytes
    pub audio: String,
    pub mime_type: String,
    #[serde(default)]
    pub sample_rate_hertz: Option<u32>,
}

/// Response with the session's rendered view
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: TranscriptView,
    /// The client must discard its cached view and reload
    pub reload: bool,
}

/// Response for cancel action
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Settings the page needs before recording
#[derive(Debug, Serialize)]
pub struct ClientConfigResponse {
    pub record_window_secs: u64,
    pub speech_timeout_secs: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
