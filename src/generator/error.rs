//! Generation error types

use thiserror::Error;

/// Text-generation failure with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::InvalidRequest, message)
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::ModelUnavailable, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::ServerError, message)
    }

    pub fn empty_output(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::EmptyOutput, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Unknown, message)
    }
}

/// Error classification, used for logging and HTTP mapping only (nothing retries)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Rejected token (401, 403)
    Auth,
    /// Bad request (400, 422)
    InvalidRequest,
    /// Model still loading or not deployed (503)
    ModelUnavailable,
    /// Other 5xx
    ServerError,
    /// Endpoint answered without any generated sequence
    EmptyOutput,
    Unknown,
}

impl GenerationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::ModelUnavailable => "model_unavailable",
            Self::ServerError => "server_error",
            Self::EmptyOutput => "empty_output",
            Self::Unknown => "unknown",
        }
    }
}
