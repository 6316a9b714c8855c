//! Core traits and types for the language tutor
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable backends (LLM, speech, memory, usage gate)
//! - CEFR proficiency levels
//! - Turn request/reply types and the correction delimiter
//! - Chat completion request/response types
//! - Error taxonomy

pub mod chat;
pub mod error;
pub mod level;
pub mod speech;
pub mod traits;
pub mod turn;
pub mod usage;

pub use chat::{ChatRequest, ChatResponse, Message, Role, TokenUsage};
pub use error::{Error, Result};
pub use level::CefrLevel;
pub use speech::{SpeechClip, Transcription};
pub use turn::{
    contains_correction, wrap_correction, TurnRequest, TurnReply,
    CORRECTION_CLOSE, CORRECTION_OPEN,
};
pub use usage::{next_utc_midnight, UsageRecord};

pub use traits::{
    LanguageModel, MemoryStore, SpeechSynthesizer, Transcriber, UsageGate,
};
