//! Conversational tutoring engine
//!
//! Drives a learner turn end to end: a grammar verdict decides between
//! the correction branch and the free-reply branch, the reply is spoken
//! through the synthesizer, and the exchange is committed to thread
//! memory. Usage metering wraps every model call.

pub mod classifier;
pub mod engine;
pub mod memory;
pub mod prompts;
pub mod state;

pub use classifier::parse_verdict;
pub use engine::{EngineConfig, TutorEngine};
pub use memory::{exchange_entry, InMemoryMemoryStore};
pub use prompts::TutorPrompts;
pub use state::{TurnEvent, TurnPhase, TurnState};
