//! Speech acquisition error types

use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct SpeechError {
    pub kind: SpeechErrorKind,
    pub message: String,
}

impl SpeechError {
    pub fn new(kind: SpeechErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unintelligible(message: impl Into<String>) -> Self {
        Self::new(SpeechErrorKind::Unintelligible, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(SpeechErrorKind::ServiceUnavailable, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(SpeechErrorKind::Cancelled, message)
    }

    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::new(SpeechErrorKind::DeviceUnavailable, message)
    }

    pub fn clip_too_long(message: impl Into<String>) -> Self {
        Self::new(SpeechErrorKind::ClipTooLong, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// The service heard audio but could not map it to text
    Unintelligible,
    /// Network failure, HTTP error or timeout talking to the service
    ServiceUnavailable,
    /// The user stopped the recording
    Cancelled,
    /// No usable audio was captured
    DeviceUnavailable,
    /// The clip is larger than the recording window allows
    ClipTooLong,
}

impl SpeechErrorKind {
    /// Soft failures become pending input text instead of failing the request
    pub fn is_soft(self) -> bool {
        matches!(self, Self::Unintelligible | Self::ServiceUnavailable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unintelligible => "unintelligible",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Cancelled => "cancelled",
            Self::DeviceUnavailable => "device_unavailable",
            Self::ClipTooLong => "clip_too_long",
        }
    }
}
