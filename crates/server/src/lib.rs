//! LingoTutor Server
//!
//! HTTP API for the language tutor: conversational turns, practice
//! chains, transcription, and synthesized-audio delivery.

pub mod audio;
pub mod http;
pub mod metrics;
pub mod state;

pub use audio::AudioCache;
pub use http::create_router;
pub use metrics::{
    init_metrics, record_chain_run, record_llm_latency, record_speech_latency, record_turn,
    record_turn_latency,
};
pub use state::AppState;
