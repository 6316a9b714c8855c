//! Single-shot prompt chains
//!
//! Each chain turns a typed input into one chat completion and parses the
//! model's sectioned answer back into a typed output. Formatting slips are
//! absorbed with fallback text; provider failures surface as errors.

pub mod pronunciation;
pub mod question;
pub mod response;
pub mod sections;
pub mod tips;
pub mod translation;

#[cfg(test)]
mod testing;

pub use pronunciation::{PronunciationChain, PronunciationInput, PronunciationReport};
pub use question::{PracticeQuestion, QuestionChain, QuestionInput};
pub use response::{ResponseChain, ResponseInput, ResponseReview};
pub use sections::SectionParser;
pub use tips::{StudyTip, TipsChain, TipsInput};
pub use translation::{TranslationChain, TranslationInput, TranslationReview};
