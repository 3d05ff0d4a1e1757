//! Speech input acquisition
//!
//! A clip is captured from an [`AudioSource`] and handed to a
//! [`SpeechRecognizer`]. Recognition runs under an explicit timeout and a
//! cancellation token; the two expected failures (unintelligible audio and
//! an unavailable service) are folded into text rather than raised.

mod error;
mod google;

pub use error::{SpeechError, SpeechErrorKind};
pub use google::GoogleSpeechRecognizer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pending input used when the service could not make sense of the audio
pub const UNINTELLIGIBLE_PLACEHOLDER: &str = "Sorry, could not understand the audio.";

/// Prefix of the pending input used when the service call failed
pub const SERVICE_ERROR_PREFIX: &str = "Error: ";

/// Upper bound on audio bytes per second of recording window. Covers
/// uncompressed 48 kHz 16-bit stereo with headroom.
pub const MAX_CLIP_BYTES_PER_SECOND: u128 = 256 * 1024;

/// Largest clip accepted for a recording window
pub fn max_clip_bytes(window: Duration) -> u128 {
    window.as_millis().saturating_mul(MAX_CLIP_BYTES_PER_SECOND) / 1000
}

/// Recorded audio, encoded as the recorder produced it
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub sample_rate_hertz: Option<u32>,
}

/// Where a clip comes from
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Capture at most `window` of audio
    async fn capture(
        &self,
        window: Duration,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, SpeechError>;
}

/// A clip the browser already recorded (bounded by the window it was given)
/// and uploaded with the request
pub struct UploadedClip {
    clip: AudioClip,
}

impl UploadedClip {
    pub fn new(clip: AudioClip) -> Self {
        Self { clip }
    }
}

#[async_trait]
impl AudioSource for UploadedClip {
    async fn capture(
        &self,
        window: Duration,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, SpeechError> {
        if cancel.is_cancelled() {
            return Err(SpeechError::cancelled("Recording cancelled"));
        }
        if self.clip.data.is_empty() {
            return Err(SpeechError::device_unavailable("No audio was captured"));
        }
        let size = u128::try_from(self.clip.data.len()).unwrap_or(u128::MAX);
        if size > max_clip_bytes(window) {
            return Err(SpeechError::clip_too_long(format!(
                "Clip of {size} bytes exceeds the {}s recording window",
                window.as_secs()
            )));
        }
        Ok(self.clip.clone())
    }
}

/// Speech-to-text backend
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, clip: &AudioClip) -> Result<String, SpeechError>;

    fn service_id(&self) -> &str;
}

/// Logging wrapper for recognizers
pub struct LoggingRecognizer {
    inner: Arc<dyn SpeechRecognizer>,
    service_id: String,
}

impl LoggingRecognizer {
    pub fn new(inner: Arc<dyn SpeechRecognizer>) -> Self {
        let service_id = inner.service_id().to_string();
        Self { inner, service_id }
    }
}

#[async_trait]
impl SpeechRecognizer for LoggingRecognizer {
    async fn recognize(&self, clip: &AudioClip) -> Result<String, SpeechError> {
        let start = std::time::Instant::now();
        let result = self.inner.recognize(clip).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    service = %self.service_id,
                    duration_ms = %duration.as_millis(),
                    audio_bytes = clip.data.len(),
                    transcript_chars = text.len(),
                    "Speech recognized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    service = %self.service_id,
                    duration_ms = %duration.as_millis(),
                    audio_bytes = clip.data.len(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Speech recognition failed"
                );
            }
        }

        result
    }

    fn service_id(&self) -> &str {
        &self.service_id
    }
}

/// Result of one speech acquisition, soft failures included
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    Heard(String),
    Unintelligible,
    ServiceFailed(String),
}

impl Transcription {
    /// Text staged as pending input for this outcome
    pub fn into_text(self) -> String {
        match self {
            Transcription::Heard(text) => text,
            Transcription::Unintelligible => UNINTELLIGIBLE_PLACEHOLDER.to_string(),
            Transcription::ServiceFailed(detail) => format!("{SERVICE_ERROR_PREFIX}{detail}"),
        }
    }
}

/// Capture one clip and transcribe it.
///
/// Only cancellation and a missing clip come back as `Err`; unintelligible
/// audio, service errors and timeouts are returned as [`Transcription`]s.
pub async fn acquire(
    source: &dyn AudioSource,
    recognizer: &dyn SpeechRecognizer,
    window: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Transcription, SpeechError> {
    let clip = source.capture(window, cancel).await?;

    let recognition = tokio::select! {
        () = cancel.cancelled() => {
            return Err(SpeechError::cancelled("Recording cancelled"));
        }
        result = tokio::time::timeout(timeout, recognizer.recognize(&clip)) => result,
    };

    match recognition {
        Ok(Ok(text)) => Ok(Transcription::Heard(text)),
        Ok(Err(e)) if !e.kind.is_soft() => Err(e),
        Ok(Err(e)) if e.kind == SpeechErrorKind::Unintelligible => Ok(Transcription::Unintelligible),
        Ok(Err(e)) => Ok(Transcription::ServiceFailed(e.message)),
        Err(_) => Ok(Transcription::ServiceFailed(format!(
            "recognition timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
