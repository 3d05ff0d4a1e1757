//! Google Cloud Speech-to-Text client (`speech:recognize` REST)

use super::{AudioClip, SpeechError, SpeechRecognizer};
use crate::config::SpeechConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct GoogleSpeechRecognizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    language: String,
}

impl GoogleSpeechRecognizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                SpeechError::service_unavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    fn translate_request(&self, clip: &AudioClip) -> RecognizeRequest {
        RecognizeRequest {
            config: RecognitionConfig {
                encoding: encoding_for(&clip.mime_type),
                language_code: self.language.clone(),
                sample_rate_hertz: clip.sample_rate_hertz,
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(&clip.data),
            },
        }
    }

    fn parse_transcript(body: &str) -> Result<String, SpeechError> {
        let parsed: RecognizeResponse = serde_json::from_str(body).map_err(|e| {
            SpeechError::service_unavailable(format!("unreadable recognition response: {e}"))
        })?;

        // One result per consecutive stretch of speech; take the best alternative of each
        let transcript = parsed
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.is_empty() {
            Err(SpeechError::unintelligible("no transcription in response"))
        } else {
            Ok(transcript)
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(&self, clip: &AudioClip) -> Result<String, SpeechError> {
        let request = self.translate_request(clip);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }

        let response = builder.send().await.map_err(|e| {
            SpeechError::service_unavailable(format!("recognition request failed: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SpeechError::service_unavailable(format!("recognition response unreadable: {e}"))
        })?;

        if !status.is_success() {
            return Err(SpeechError::service_unavailable(format!(
                "recognition request failed: {status}: {}",
                body.trim()
            )));
        }

        Self::parse_transcript(&body)
    }

    fn service_id(&self) -> &str {
        "google-speech"
    }
}

/// Map a browser recording MIME type (parameters ignored) to an API encoding
fn encoding_for(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/webm" => "WEBM_OPUS",
        "audio/ogg" => "OGG_OPUS",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "LINEAR16",
        "audio/flac" | "audio/x-flac" => "FLAC",
        _ => "ENCODING_UNSPECIFIED",
    }
}

// Speech API types

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}
