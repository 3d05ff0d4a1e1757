//! Prompt template and response extraction

/// Marker separating the prompt from the model's continuation
pub const DELIMITER: &str = "Chatbot:";

/// Build the single-message prompt. No earlier turns are included.
pub fn build_prompt(user_input: &str) -> String {
    format!("User: {user_input}\n{DELIMITER}")
}

/// Reply text pulled out of a generated sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedResponse {
    pub text: String,
    /// False when the model output never contained [`DELIMITER`] and the
    /// whole output was used instead
    pub delimiter_found: bool,
}

/// Take the trimmed text after the last [`DELIMITER`].
///
/// Falls back to the whole trimmed output when the delimiter is missing.
pub fn extract_response(generated: &str) -> ExtractedResponse {
    match generated.rsplit_once(DELIMITER) {
        Some((_, continuation)) => ExtractedResponse {
            text: continuation.trim().to_string(),
            delimiter_found: true,
        },
        None => ExtractedResponse {
            text: generated.trim().to_string(),
            delimiter_found: false,
        },
    }
}
