//! CEFR proficiency levels
//!
//! The Common European Framework of Reference tiers (A1 lowest to C2
//! highest) parameterize the vocabulary and sentence complexity of every
//! generated prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CEFR proficiency level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CefrLevel {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels in ascending order
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// Get the two-character CEFR code
    pub fn code(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    /// Get a human-readable description
    pub fn describe(&self) -> &'static str {
        match self {
            Self::A1 => "beginner",
            Self::A2 => "elementary",
            Self::B1 => "intermediate",
            Self::B2 => "upper intermediate",
            Self::C1 => "advanced",
            Self::C2 => "proficient",
        }
    }

    /// Get level-specific vocabulary guidance for prompt construction
    pub fn vocabulary_guidance(&self) -> &'static str {
        match self {
            Self::A1 => {
                "Use only the most common everyday words and short present-tense \
                 sentences. One idea per sentence. Avoid idioms entirely."
            }
            Self::A2 => {
                "Use high-frequency vocabulary and simple past and future forms. \
                 Keep sentences short and concrete."
            }
            Self::B1 => {
                "Use everyday vocabulary with some topic-specific words. \
                 Compound sentences are fine; avoid rare idioms."
            }
            Self::B2 => {
                "Use a broad vocabulary including common idioms and phrasal \
                 verbs. Complex sentences are fine."
            }
            Self::C1 => {
                "Use rich, natural vocabulary including nuanced expressions and \
                 less common idioms."
            }
            Self::C2 => {
                "Use fully natural, sophisticated language with no simplification."
            }
        }
    }

    /// Suggested maximum reply length in sentences for conversational output
    pub fn max_reply_sentences(&self) -> u8 {
        match self {
            Self::A1 => 2,
            Self::A2 => 3,
            Self::B1 => 3,
            Self::B2 => 4,
            Self::C1 => 5,
            Self::C2 => 5,
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for CefrLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            other => Err(crate::Error::InvalidRequest(format!(
                "unknown CEFR level: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for level in CefrLevel::ALL {
            let parsed: CefrLevel = level.code().parse().unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("b2".parse::<CefrLevel>().unwrap(), CefrLevel::B2);
        assert_eq!(" c1 ".parse::<CefrLevel>().unwrap(), CefrLevel::C1);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("D1".parse::<CefrLevel>().is_err());
        assert!("".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(CefrLevel::A1 < CefrLevel::C2);
        assert!(CefrLevel::B2 > CefrLevel::B1);
    }
}
