//! Response generation
//!
//! Wraps an external text-generation model behind a small trait and turns
//! a single user message into a reply.

mod error;
mod huggingface;
mod prompt;

pub use error::{GenerationError, GenerationErrorKind};
pub use huggingface::HuggingFaceGenerator;
pub use prompt::{build_prompt, extract_response, ExtractedResponse, DELIMITER};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for text-generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Continue `prompt`, returning the full generated sequence
    async fn generate(&self, prompt: &str, max_length: u32) -> Result<String, GenerationError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for text generators
pub struct LoggingGenerator {
    inner: Arc<dyn TextGenerator>,
    model_id: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl TextGenerator for LoggingGenerator {
    async fn generate(&self, prompt: &str, max_length: u32) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(prompt, max_length).await;
        let duration = start.elapsed();

        match &result {
            Ok(generated) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = prompt.len(),
                    generated_chars = generated.len(),
                    "Generation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Generation failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Turns one user message into one reply: template, model call, extraction.
pub struct ResponseGenerator {
    generator: Arc<dyn TextGenerator>,
    max_length: u32,
}

impl ResponseGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, max_length: u32) -> Self {
        Self {
            generator,
            max_length,
        }
    }

    /// Generate a reply for `user_input`. Errors are passed through untouched.
    pub async fn respond(&self, user_input: &str) -> Result<String, GenerationError> {
        let prompt = build_prompt(user_input);
        let generated = self.generator.generate(&prompt, self.max_length).await?;

        let ExtractedResponse {
            text,
            delimiter_found,
        } = extract_response(&generated);
        if !delimiter_found {
            tracing::warn!(
                model = %self.generator.model_id(),
                delimiter = DELIMITER,
                "Generated text has no delimiter, using the whole output"
            );
        }

        Ok(text)
    }
}
