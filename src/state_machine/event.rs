//! Events that can occur in a session

use super::state::InputMethod;
use crate::speech::Transcription;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    SelectInputMethod {
        method: InputMethod,
    },
    TextEdited {
        text: String,
    },
    RecordingStarted,
    Send,
    Clear,

    // Speech events
    SpeechCaptured {
        transcription: Transcription,
    },
    RecordingCancelled,

    // Generator events
    ResponseGenerated {
        text: String,
    },
    GenerationFailed {
        message: String,
    },
}
