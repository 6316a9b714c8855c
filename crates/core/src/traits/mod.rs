//! Trait seams between the tutor engine and its providers

pub mod gate;
pub mod llm;
pub mod memory;
pub mod speech;

pub use gate::UsageGate;
pub use llm::LanguageModel;
pub use memory::MemoryStore;
pub use speech::{SpeechSynthesizer, Transcriber};
