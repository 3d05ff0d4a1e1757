//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::Services;
use crate::generator::{GenerationError, ResponseGenerator, TextGenerator};
use crate::speech::{AudioClip, SpeechError, SpeechRecognizer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Text Generator
// ============================================================================

/// Mock generator that returns queued outputs
pub struct MockGenerator {
    outputs: Mutex<VecDeque<Result<String, GenerationError>>>,
    /// Record of all `(prompt, max_length)` calls
    pub prompts: Mutex<Vec<(String, u32)>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a generated sequence
    pub fn queue_output(&self, generated: impl Into<String>) {
        self.outputs.lock().unwrap().push_back(Ok(generated.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: GenerationError) {
        self.outputs.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, max_length: u32) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_length));
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::network("No mock output queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Speech Recognizer
// ============================================================================

/// Mock recognizer with queued transcripts and an optional delay
pub struct MockRecognizer {
    transcripts: Mutex<VecDeque<Result<String, SpeechError>>>,
    delay: Option<Duration>,
    calls: Mutex<usize>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            transcripts: Mutex::new(VecDeque::new()),
            delay: None,
            calls: Mutex::new(0),
        }
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_transcript(&self, text: impl Into<String>) {
        self.transcripts.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: SpeechError) {
        self.transcripts.lock().unwrap().push_back(Err(error));
    }

    /// Number of clips submitted for recognition
    pub fn recognized_clips(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, _clip: &AudioClip) -> Result<String, SpeechError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.transcripts.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Err(SpeechError::unintelligible("No mock transcript queued")))
    }

    fn service_id(&self) -> &str {
        "mock-speech"
    }
}

// ============================================================================
// Services
// ============================================================================

/// Services wired to the given mocks, with the default limits
pub fn test_services(generator: Arc<MockGenerator>, recognizer: Arc<MockRecognizer>) -> Services {
    Services {
        responder: ResponseGenerator::new(generator, 150),
        recognizer,
        record_window: Duration::from_secs(5),
        speech_timeout: Duration::from_secs(2),
    }
}
