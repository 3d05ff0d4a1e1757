//! Hugging Face inference endpoint client

use super::{GenerationError, TextGenerator};
use crate::config::GeneratorConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Text-generation pipeline served over HTTP
pub struct HuggingFaceGenerator {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model_id: String,
}

impl HuggingFaceGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            model_id: config.model.clone(),
        })
    }

    fn translate_request(prompt: &str, max_length: u32) -> GenerationRequest<'_> {
        GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_length,
                num_return_sequences: 1,
                return_full_text: true,
            },
        }
    }

    fn parse_response(body: &str) -> Result<String, GenerationError> {
        let parsed: GenerationResponse = serde_json::from_str(body).map_err(|e| {
            GenerationError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        let sequence = match parsed {
            GenerationResponse::Batch(sequences) => sequences.into_iter().next(),
            GenerationResponse::Single(sequence) => Some(sequence),
        };

        sequence
            .map(|s| s.generated_text)
            .ok_or_else(|| GenerationError::empty_output("Model returned no sequences"))
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> GenerationError {
        // Error bodies look like {"error": "..."}; fall back to the raw text
        let message = serde_json::from_str::<ErrorBody>(body)
            .map_or_else(|_| body.to_string(), |b| b.error);

        match status.as_u16() {
            401 | 403 => GenerationError::auth(format!("Authentication failed: {message}")),
            400 | 422 => GenerationError::invalid_request(format!("Invalid request: {message}")),
            503 => GenerationError::model_unavailable(format!("Model unavailable: {message}")),
            500..=599 => GenerationError::server_error(format!("Server error: {message}")),
            _ => GenerationError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate(&self, prompt: &str, max_length: u32) -> Result<String, GenerationError> {
        let request = Self::translate_request(prompt, max_length);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                GenerationError::network(format!("Connection failed: {e}"))
            } else {
                GenerationError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        Self::parse_response(&body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Inference API types

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: u32,
    num_return_sequences: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Batch(Vec<GeneratedSequence>),
    Single(GeneratedSequence),
}

#[derive(Debug, Deserialize)]
struct GeneratedSequence {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}
