//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::speech::Transcription;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session", Duration::from_secs(5))
}

/// Drive a state through the full send cycle with a canned reply
fn send_and_reply(state: &SessionState, reply: &str) -> SessionState {
    let sent = transition(state, &test_context(), Event::Send)
        .expect("send accepted")
        .new_state;
    if sent.phase != ChatPhase::Generating {
        return sent;
    }
    transition(
        &sent,
        &test_context(),
        Event::ResponseGenerated {
            text: reply.to_string(),
        },
    )
    .expect("reply accepted")
    .new_state
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_input_method() -> impl Strategy<Value = InputMethod> {
    prop_oneof![Just(InputMethod::Text), Just(InputMethod::Speech)]
}

fn arb_transcription() -> impl Strategy<Value = Transcription> {
    prop_oneof![
        "[a-zA-Z ]{1,30}".prop_map(Transcription::Heard),
        Just(Transcription::Unintelligible),
        "[a-z ]{1,20}".prop_map(Transcription::ServiceFailed),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_input_method().prop_map(|method| Event::SelectInputMethod { method }),
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::TextEdited { text }),
        Just(Event::RecordingStarted),
        Just(Event::Send),
        Just(Event::Clear),
        arb_transcription().prop_map(|transcription| Event::SpeechCaptured { transcription }),
        Just(Event::RecordingCancelled),
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::ResponseGenerated { text }),
        "[a-z ]{1,20}".prop_map(|message| Event::GenerationFailed { message }),
    ]
}

/// Reachable states, built by replaying accepted events from the initial state
fn arb_state() -> impl Strategy<Value = SessionState> {
    proptest::collection::vec(arb_event(), 0..12).prop_map(|events| {
        let mut state = SessionState::default();
        for event in events {
            if let Ok(result) = transition(&state, &test_context(), event) {
                state = result.new_state;
            }
        }
        state
    })
}

fn arb_settled_state() -> impl Strategy<Value = SessionState> {
    arb_state().prop_filter("not busy", |s| !s.phase.is_busy())
}

proptest! {
    // Invariant 1: Sending non-empty input grows the conversation by exactly
    // one user turn then one bot turn, and clears pending input
    #[test]
    fn prop_send_appends_two_turns(
        state in arb_settled_state(),
        text in "[a-zA-Z0-9 ]{1,40}",
        reply in "[a-zA-Z0-9 ]{0,40}",
    ) {
        let mut state = state;
        state.input_method = InputMethod::Text;
        let staged = transition(&state, &test_context(), Event::TextEdited { text: text.clone() })
            .unwrap()
            .new_state;
        let before = staged.conversation.len();

        let after = send_and_reply(&staged, &reply);

        prop_assert_eq!(after.conversation.len(), before + 2);
        let turns = after.conversation.turns();
        prop_assert_eq!(&turns[before].text, &text);
        prop_assert!(turns[before].is_user);
        prop_assert_eq!(&turns[before + 1].text, &reply);
        prop_assert!(!turns[before + 1].is_user);
        prop_assert!(after.pending_input.is_empty());
    }

    // Invariant 2: Send with nothing staged changes nothing
    #[test]
    fn prop_empty_send_is_noop(state in arb_settled_state()) {
        let mut state = state;
        state.pending_input = PendingInput::default();
        state.phase = ChatPhase::AwaitingInput;

        let result = transition(&state, &test_context(), Event::Send).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 3: Clear always yields an empty conversation
    #[test]
    fn prop_clear_empties(state in arb_settled_state()) {
        let result = transition(&state, &test_context(), Event::Clear).unwrap();
        prop_assert!(result.new_state.conversation.is_empty());
        prop_assert!(result.effects.contains(&Effect::Reload));
    }

    // Invariant 4: Every bot turn directly follows a user turn and no empty
    // user turn is ever appended
    #[test]
    fn prop_turns_alternate(state in arb_state()) {
        let turns = state.conversation.turns();
        prop_assert_eq!(turns.len() % 2, 0);
        for pair in turns.chunks(2) {
            prop_assert!(pair[0].is_user);
            prop_assert!(!pair[0].text.is_empty());
            prop_assert!(!pair[1].is_user);
        }
    }

    // Invariant 5: Busy phases only accept their own completion events
    #[test]
    fn prop_busy_rejects_user_actions(
        state in arb_settled_state(),
        phase in prop_oneof![Just(ChatPhase::Listening), Just(ChatPhase::Generating)],
        text in "[a-z]{1,10}",
    ) {
        let mut state = state;
        state.phase = phase;
        for event in [Event::Send, Event::Clear, Event::TextEdited { text }] {
            let result = transition(&state, &test_context(), event);
            prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
        }
    }

    // Invariant 6: Settled phase always agrees with pending input
    #[test]
    fn prop_phase_matches_pending(state in arb_settled_state()) {
        prop_assert_eq!(state.phase, ChatPhase::settled(&state.pending_input));
    }

    // Invariant 7: A speech capture always stages the transcription text
    #[test]
    fn prop_speech_capture_stages_text(transcription in arb_transcription()) {
        let mut state = SessionState {
            input_method: InputMethod::Speech,
            ..SessionState::default()
        };
        state = transition(&state, &test_context(), Event::RecordingStarted)
            .unwrap()
            .new_state;

        let expected = transcription.clone().into_text();
        let result = transition(&state, &test_context(), Event::SpeechCaptured { transcription })
            .unwrap();

        prop_assert_eq!(result.new_state.pending_input.as_str(), expected.as_str());
        prop_assert_eq!(result.new_state.phase, ChatPhase::InputCaptured);
    }
}
