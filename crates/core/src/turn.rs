//! Conversational turn types
//!
//! A turn is one round trip through the tutor: the learner's utterance in,
//! the tutor's text and optional speech out. Correction replies carry the
//! corrected sentence between marker tags so clients can highlight it and
//! skip playback.

use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;
use crate::speech::SpeechClip;

/// Opening marker around a corrected sentence in a tutor reply.
pub const CORRECTION_OPEN: &str = "<error-correction>";
/// Closing marker around a corrected sentence in a tutor reply.
pub const CORRECTION_CLOSE: &str = "</error-correction>";

/// Wrap a correction in the marker tags.
pub fn wrap_correction(text: &str) -> String {
    format!("{CORRECTION_OPEN}{text}{CORRECTION_CLOSE}")
}

/// True when a reply carries a correction marker.
pub fn contains_correction(text: &str) -> bool {
    text.contains(CORRECTION_OPEN)
}

/// One learner turn submitted to the tutor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Learner's proficiency level
    #[serde(default)]
    pub level: CefrLevel,
    /// Conversation topic (e.g. "Food")
    pub topic: String,
    /// What the learner said or typed
    pub user_input: String,
    /// Running transcript the client has seen so far; empty when the
    /// client relies on the server-held thread memory
    #[serde(default)]
    pub history: String,
    /// Language explanations should be given in (e.g. "English")
    #[serde(default = "default_user_language")]
    pub user_language: String,
    /// Conversation thread this turn belongs to; the memory partition key,
    /// stable across a session
    pub thread_id: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

impl TurnRequest {
    /// Create a turn request with defaults for history and user language
    pub fn new(
        thread_id: impl Into<String>,
        topic: impl Into<String>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            level: CefrLevel::default(),
            topic: topic.into(),
            user_input: user_input.into(),
            history: String::new(),
            user_language: default_user_language(),
            thread_id: thread_id.into(),
        }
    }

    /// Set the learner level
    pub fn with_level(mut self, level: CefrLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the prior transcript
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = history.into();
        self
    }

    /// Set the explanation language
    pub fn with_user_language(mut self, user_language: impl Into<String>) -> Self {
        self.user_language = user_language.into();
        self
    }
}

/// The tutor's reply to one turn.
///
/// Always fully formed: `ai_output` is usable text and `history` is the
/// complete post-turn transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    /// Reply text; corrections are wrapped in marker tags
    pub ai_output: String,
    /// Full transcript after this turn
    pub history: String,
    /// Whether this reply is a grammar correction
    pub has_grammar_error: bool,
    /// Synthesized speech for the reply, when synthesis ran and succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechClip>,
}
