//! Turn phases and the transition function
//!
//! One turn walks a fixed graph with a single conditional branch:
//!
//! ```text
//! GrammarCheck --has_error--> Correction ----\
//!      |                                      +--> SpeechSynthesis --> Done
//!      \--no error--> FreeReply -------------/
//! ```
//!
//! Transitions are a pure total function over (phase, event); events that
//! do not apply to the current phase leave it unchanged, and `Done` is
//! terminal.

use serde::{Deserialize, Serialize};

use lingotutor_core::{SpeechClip, TurnRequest};

/// Phase of one conversational turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Deciding whether the learner's input has a grammar error
    #[default]
    GrammarCheck,
    /// Producing a correction for an errored input
    Correction,
    /// Producing a free conversational reply
    FreeReply,
    /// Turning the reply into speech
    SpeechSynthesis,
    /// Turn complete
    Done,
}

/// Something that happened while processing a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// The grammar verdict arrived
    GrammarChecked { has_error: bool },
    /// The correction text is ready
    CorrectionProduced,
    /// The conversational reply text is ready
    ReplyProduced,
    /// Synthesis finished (ran, was skipped, or failed)
    SpeechFinished,
}

impl TurnPhase {
    /// The phase after `event`.
    ///
    /// Total: events that do not apply to the current phase are identity
    /// transitions.
    pub fn next(self, event: &TurnEvent) -> TurnPhase {
        match (self, event) {
            (TurnPhase::GrammarCheck, TurnEvent::GrammarChecked { has_error: true }) => {
                TurnPhase::Correction
            }
            (TurnPhase::GrammarCheck, TurnEvent::GrammarChecked { has_error: false }) => {
                TurnPhase::FreeReply
            }
            (TurnPhase::Correction, TurnEvent::CorrectionProduced) => TurnPhase::SpeechSynthesis,
            (TurnPhase::FreeReply, TurnEvent::ReplyProduced) => TurnPhase::SpeechSynthesis,
            (TurnPhase::SpeechSynthesis, TurnEvent::SpeechFinished) => TurnPhase::Done,
            (phase, _) => phase,
        }
    }

    /// True once the turn has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Done)
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnPhase::GrammarCheck => "grammar_check",
            TurnPhase::Correction => "correction",
            TurnPhase::FreeReply => "free_reply",
            TurnPhase::SpeechSynthesis => "speech_synthesis",
            TurnPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Mutable record of one in-flight turn.
///
/// Created fresh per turn and consumed when the reply is built; nothing
/// here outlives the turn.
#[derive(Debug)]
pub struct TurnState {
    pub request: TurnRequest,
    pub phase: TurnPhase,
    pub has_grammar_error: bool,
    pub grammar_correction: Option<String>,
    pub ai_output: String,
    pub speech: Option<SpeechClip>,
    pub has_speech_output: bool,
}

impl TurnState {
    /// Start a turn in `GrammarCheck`
    pub fn new(request: TurnRequest) -> Self {
        Self {
            request,
            phase: TurnPhase::default(),
            has_grammar_error: false,
            grammar_correction: None,
            ai_output: String::new(),
            speech: None,
            has_speech_output: false,
        }
    }

    /// Apply an event to the phase
    pub fn advance(&mut self, event: TurnEvent) {
        let from = self.phase;
        self.phase = from.next(&event);
        if self.phase != from {
            tracing::debug!(
                thread_id = %self.request.thread_id,
                from = %from,
                to = %self.phase,
                "turn phase transition"
            );
        }
    }
}
