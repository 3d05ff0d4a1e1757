//! Session runtime executor

use super::Services;
use crate::generator::GenerationError;
use crate::speech::{self, AudioSource, SpeechError, SpeechErrorKind};
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SessionState, TransitionError,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Why an interaction failed
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Response generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Speech capture failed: {0}")]
    Speech(#[from] SpeechError),
}

/// What the client needs to know after a successful interaction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Session was reset; the client must drop its cached view
    pub reload: bool,
}

/// Audio available to the capture effect of one interaction
struct SpeechCapture<'a> {
    source: &'a dyn AudioSource,
    cancel: CancellationToken,
}

enum EffectOutcome {
    Done,
    Reload,
    Next(Event),
    /// The effect failed: apply `follow_up`, then report `error`
    Failed {
        follow_up: Event,
        error: DispatchError,
    },
}

/// Runs events for one session against its state, performing the effects
/// each transition asks for
pub struct SessionRuntime {
    context: SessionContext,
    state: SessionState,
    services: Arc<Services>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionRuntime {
    pub fn new(
        context: SessionContext,
        services: Arc<Services>,
        state_tx: watch::Sender<SessionState>,
    ) -> Self {
        let state = SessionState::default();
        state_tx.send_replace(state.clone());
        Self {
            context,
            state,
            services,
            state_tx,
        }
    }

    /// Handle a user action that needs no audio
    pub async fn dispatch(&mut self, event: Event) -> Result<DispatchOutcome, DispatchError> {
        self.process_event(event, None).await
    }

    /// Start a recording using `source`; `cancel` aborts it
    pub async fn record_speech(
        &mut self,
        source: &dyn AudioSource,
        cancel: CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let capture = SpeechCapture { source, cancel };
        self.process_event(Event::RecordingStarted, Some(&capture))
            .await
    }

    async fn process_event(
        &mut self,
        event: Event,
        capture: Option<&SpeechCapture<'_>>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut outcome = DispatchOutcome::default();
        let mut failure = None;

        // Effects can produce follow-up events; process them in a loop
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.context, current_event)?;

            self.state = result.new_state;
            self.state_tx.send_replace(self.state.clone());

            for effect in result.effects {
                match self.execute_effect(effect, capture).await {
                    EffectOutcome::Done => {}
                    EffectOutcome::Reload => outcome.reload = true,
                    EffectOutcome::Next(next) => events_to_process.push(next),
                    EffectOutcome::Failed { follow_up, error } => {
                        events_to_process.push(follow_up);
                        failure = Some(error);
                    }
                }
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(outcome),
        }
    }

    async fn execute_effect(
        &self,
        effect: Effect,
        capture: Option<&SpeechCapture<'_>>,
    ) -> EffectOutcome {
        let session_id = &self.context.session_id;

        match effect {
            Effect::Render => {
                tracing::debug!(
                    session_id = %session_id,
                    phase = ?self.state.phase,
                    turns = self.state.conversation.len(),
                    "Session updated"
                );
                EffectOutcome::Done
            }

            Effect::Reload => {
                tracing::info!(session_id = %session_id, "Conversation cleared");
                EffectOutcome::Reload
            }

            Effect::GenerateResponse { input } => {
                match self.services.responder.respond(&input).await {
                    Ok(text) => EffectOutcome::Next(Event::ResponseGenerated { text }),
                    Err(e) => {
                        tracing::error!(session_id = %session_id, error = %e, "No reply generated");
                        EffectOutcome::Failed {
                            follow_up: Event::GenerationFailed {
                                message: e.message.clone(),
                            },
                            error: e.into(),
                        }
                    }
                }
            }

            Effect::CaptureSpeech { window } => {
                let Some(capture) = capture else {
                    return EffectOutcome::Failed {
                        follow_up: Event::RecordingCancelled,
                        error: SpeechError::device_unavailable("No audio source attached").into(),
                    };
                };

                let result = speech::acquire(
                    capture.source,
                    self.services.recognizer.as_ref(),
                    window,
                    self.services.speech_timeout,
                    &capture.cancel,
                )
                .await;

                match result {
                    Ok(transcription) => {
                        EffectOutcome::Next(Event::SpeechCaptured { transcription })
                    }
                    Err(e) if e.kind == SpeechErrorKind::Cancelled => {
                        tracing::info!(session_id = %session_id, "Recording cancelled");
                        EffectOutcome::Next(Event::RecordingCancelled)
                    }
                    Err(e) => {
                        tracing::error!(session_id = %session_id, error = %e, "Speech capture failed");
                        EffectOutcome::Failed {
                            follow_up: Event::RecordingCancelled,
                            error: e.into(),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use crate::runtime::testing::{test_services, MockGenerator, MockRecognizer};
    use crate::speech::{AudioClip, UploadedClip};
    use crate::state_machine::{ChatPhase, InputMethod};
    use std::time::Duration;

    struct Harness {
        runtime: SessionRuntime,
        state_rx: watch::Receiver<SessionState>,
        generator: Arc<MockGenerator>,
        recognizer: Arc<MockRecognizer>,
    }

    fn harness() -> Harness {
        let generator = Arc::new(MockGenerator::new());
        let recognizer = Arc::new(MockRecognizer::new());
        let services = Arc::new(test_services(generator.clone(), recognizer.clone()));
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let context = SessionContext::new("session-1", Duration::from_secs(5));
        Harness {
            runtime: SessionRuntime::new(context, services, state_tx),
            state_rx,
            generator,
            recognizer,
        }
    }

    fn upload(bytes: &[u8]) -> UploadedClip {
        UploadedClip::new(AudioClip {
            data: bytes.to_vec(),
            mime_type: "audio/webm".to_string(),
            sample_rate_hertz: None,
        })
    }

    fn current(h: &Harness) -> SessionState {
        h.state_rx.borrow().clone()
    }

    #[tokio::test]
    async fn test_hello_scenario() {
        let mut h = harness();
        h.generator.queue_output("User: Hello\nChatbot: Hi there!");

        h.runtime
            .dispatch(Event::TextEdited {
                text: "Hello".to_string(),
            })
            .await
            .unwrap();
        let outcome = h.runtime.dispatch(Event::Send).await.unwrap();

        assert!(!outcome.reload);
        let state = current(&h);
        let view = render(&SessionContext::new("session-1", Duration::from_secs(5)), &state);
        assert_eq!(view.lines(), vec!["User: Hello", "Chatbot: Hi there!"]);
        assert_eq!(state.pending_input.as_str(), "");
        assert_eq!(state.phase, ChatPhase::AwaitingInput);
    }

    #[tokio::test]
    async fn test_empty_send_does_not_call_generator() {
        let mut h = harness();
        h.runtime.dispatch(Event::Send).await.unwrap();
        assert!(h.generator.recorded_prompts().is_empty());
        assert!(current(&h).conversation.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces() {
        let mut h = harness();
        h.generator
            .queue_error(GenerationError::model_unavailable("Model gpt2 is loading"));
        h.runtime
            .dispatch(Event::TextEdited {
                text: "Hello".to_string(),
            })
            .await
            .unwrap();

        let err = h.runtime.dispatch(Event::Send).await.unwrap_err();

        assert!(matches!(err, DispatchError::Generation(_)));
        let state = current(&h);
        assert!(state.conversation.is_empty());
        assert_eq!(state.pending_input.as_str(), "Hello");
        assert_eq!(state.phase, ChatPhase::InputCaptured);
    }

    #[tokio::test]
    async fn test_clear_requests_reload() {
        let mut h = harness();
        h.generator.queue_output("User: a\nChatbot: b");
        h.runtime
            .dispatch(Event::TextEdited {
                text: "a".to_string(),
            })
            .await
            .unwrap();
        h.runtime.dispatch(Event::Send).await.unwrap();

        let outcome = h.runtime.dispatch(Event::Clear).await.unwrap();

        assert!(outcome.reload);
        assert!(current(&h).conversation.is_empty());
    }

    #[tokio::test]
    async fn test_speech_then_send() {
        let mut h = harness();
        h.recognizer.queue_transcript("what is rust");
        h.generator.queue_output("User: what is rust\nChatbot: A language.");
        h.runtime
            .dispatch(Event::SelectInputMethod {
                method: InputMethod::Speech,
            })
            .await
            .unwrap();

        h.runtime
            .record_speech(&upload(b"opus"), CancellationToken::new())
            .await
            .unwrap();
        let state = current(&h);
        assert_eq!(state.pending_input.as_str(), "what is rust");
        assert_eq!(state.last_transcription.as_deref(), Some("what is rust"));

        h.runtime.dispatch(Event::Send).await.unwrap();
        assert_eq!(current(&h).conversation.len(), 2);
        assert_eq!(
            h.generator.recorded_prompts()[0].0,
            "User: what is rust\nChatbot:"
        );
    }

    #[tokio::test]
    async fn test_unintelligible_speech_is_not_an_error() {
        let mut h = harness();
        h.recognizer
            .queue_error(SpeechError::unintelligible("no results"));
        h.runtime
            .dispatch(Event::SelectInputMethod {
                method: InputMethod::Speech,
            })
            .await
            .unwrap();

        h.runtime
            .record_speech(&upload(b"noise"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            current(&h).pending_input.as_str(),
            "Sorry, could not understand the audio."
        );
    }

    #[tokio::test]
    async fn test_cancelled_recording() {
        let mut h = harness();
        h.runtime
            .dispatch(Event::SelectInputMethod {
                method: InputMethod::Speech,
            })
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        h.runtime.record_speech(&upload(b"x"), cancel).await.unwrap();

        let state = current(&h);
        assert_eq!(state.phase, ChatPhase::AwaitingInput);
        assert!(state.pending_input.is_empty());
    }

    #[tokio::test]
    async fn test_empty_clip_fails_interaction() {
        let mut h = harness();
        h.runtime
            .dispatch(Event::SelectInputMethod {
                method: InputMethod::Speech,
            })
            .await
            .unwrap();

        let err = h
            .runtime
            .record_speech(&upload(b""), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Speech(SpeechError {
                kind: SpeechErrorKind::DeviceUnavailable,
                ..
            })
        ));
        assert_eq!(current(&h).phase, ChatPhase::AwaitingInput);
    }

    #[tokio::test]
    async fn test_recording_in_text_mode_is_rejected() {
        let mut h = harness();
        let err = h
            .runtime
            .record_speech(&upload(b"x"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transition(TransitionError::WrongInputMethod(_))
        ));
        assert_eq!(h.recognizer.recognized_clips(), 0);
    }
}
