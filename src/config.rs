//! Service configuration
//!
//! Everything is read once from the environment at startup.

use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GENERATOR_URL: &str = "https://api-inference.huggingface.co/models/gpt2";
const DEFAULT_GENERATOR_MODEL: &str = "gpt2";
const DEFAULT_MAX_LENGTH: u32 = 150;
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
const DEFAULT_RECORD_WINDOW_SECS: u64 = 5;
const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Text-generation endpoint settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_token: Option<String>,
    /// Upper bound on generated length, prompt included
    pub max_length: u32,
    pub timeout: Duration,
}

/// Speech-to-text service settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub language: String,
    /// Longest clip the browser records for one utterance
    pub record_window: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Sessions idle longer than this are dropped
    pub session_ttl: Duration,
    pub generator: GeneratorConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                non_empty(key)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            port: non_empty("CHATBOT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            session_ttl: secs("CHATBOT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            generator: GeneratorConfig {
                endpoint: non_empty("CHATBOT_GENERATOR_URL")
                    .unwrap_or_else(|| DEFAULT_GENERATOR_URL.to_string()),
                model: non_empty("CHATBOT_GENERATOR_MODEL")
                    .unwrap_or_else(|| DEFAULT_GENERATOR_MODEL.to_string()),
                api_token: non_empty("HF_API_TOKEN"),
                max_length: non_empty("CHATBOT_MAX_LENGTH")
                    .and_then(|v| v.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_MAX_LENGTH),
                timeout: secs("CHATBOT_GENERATOR_TIMEOUT_SECS", DEFAULT_GENERATOR_TIMEOUT_SECS),
            },
            speech: SpeechConfig {
                endpoint: non_empty("CHATBOT_SPEECH_URL")
                    .unwrap_or_else(|| DEFAULT_SPEECH_URL.to_string()),
                api_key: non_empty("GOOGLE_SPEECH_API_KEY"),
                language: non_empty("CHATBOT_SPEECH_LANGUAGE")
                    .unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string()),
                record_window: secs("CHATBOT_RECORD_WINDOW_SECS", DEFAULT_RECORD_WINDOW_SECS),
                timeout: secs("CHATBOT_SPEECH_TIMEOUT_SECS", DEFAULT_SPEECH_TIMEOUT_SECS),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
