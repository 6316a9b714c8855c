//! Section-marker parsing for model answers
//!
//! Chains ask the model to answer in named `HEADER:` sections. Models
//! mostly comply but decorate headers with markdown, change case, or drop
//! sections entirely, so extraction is forgiving: headers match
//! case-insensitively at line starts through `#`/`*`/`-` decoration, a
//! section's text runs until the next known header, and a missing section
//! falls back to caller-supplied default text.

use std::collections::HashMap;

/// Parser for one chain's set of known headers
#[derive(Debug, Clone)]
pub struct SectionParser {
    /// Canonical headers, uppercase, without the trailing colon
    headers: Vec<String>,
}

impl SectionParser {
    /// Create a parser for the given headers (with or without colons)
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|h| h.as_ref().trim_end_matches(':').to_uppercase())
                .collect(),
        }
    }

    /// Parse a model answer into its sections
    pub fn parse(&self, text: &str) -> ParsedSections {
        let mut sections: HashMap<String, String> = HashMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            match self.match_header(line) {
                Some((header, rest)) => {
                    let body = sections.entry(header.clone()).or_default();
                    if !rest.is_empty() {
                        body.push_str(rest);
                        body.push('\n');
                    }
                    current = Some(header);
                }
                None => {
                    if let Some(body) = current.as_ref().and_then(|h| sections.get_mut(h)) {
                        body.push_str(line);
                        body.push('\n');
                    }
                }
            }
        }

        for body in sections.values_mut() {
            *body = body.trim().to_string();
        }

        ParsedSections { sections }
    }

    /// Match a line against the known headers, returning the canonical
    /// header and the rest of the line after the colon.
    fn match_header<'a>(&self, line: &'a str) -> Option<(String, &'a str)> {
        let stripped =
            line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '-'));

        for header in &self.headers {
            let marker = format!("{header}:");
            let matches = stripped
                .get(..marker.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&marker));
            if matches {
                let rest = stripped[marker.len()..]
                    .trim_start_matches(|c: char| c.is_whitespace() || c == '*')
                    .trim_end();
                return Some((header.clone(), rest));
            }
        }
        None
    }
}

/// Sections extracted from one model answer
#[derive(Debug, Clone)]
pub struct ParsedSections {
    sections: HashMap<String, String>,
}

impl ParsedSections {
    /// A section's text, when the model produced it non-empty
    pub fn get(&self, header: &str) -> Option<&str> {
        self.sections
            .get(&header.trim_end_matches(':').to_uppercase())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// A section's text, or the fallback when missing or empty
    pub fn get_or(&self, header: &str, fallback: &str) -> String {
        self.get(header)
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SectionParser {
        SectionParser::new(["QUESTION", "HINT"])
    }

    #[test]
    fn test_plain_sections() {
        let parsed = parser().parse("QUESTION: What did you eat today?\nHINT: Use the past tense.");
        assert_eq!(parsed.get("QUESTION"), Some("What did you eat today?"));
        assert_eq!(parsed.get("HINT"), Some("Use the past tense."));
    }

    #[test]
    fn test_multiline_section_runs_to_next_header() {
        let parsed = parser().parse(
            "QUESTION: Describe your favorite meal.\nThink about taste and smell.\nHINT: Adjectives help.",
        );
        assert_eq!(
            parsed.get("QUESTION"),
            Some("Describe your favorite meal.\nThink about taste and smell.")
        );
        assert_eq!(parsed.get("HINT"), Some("Adjectives help."));
    }

    #[test]
    fn test_case_insensitive_and_decorated_headers() {
        let parsed = parser().parse("## Question: One?\n**Hint:** Two.");
        assert_eq!(parsed.get("QUESTION"), Some("One?"));
        assert_eq!(parsed.get("HINT"), Some("Two."));
    }

    #[test]
    fn test_missing_section_falls_back() {
        let parsed = parser().parse("QUESTION: Only this.");
        assert_eq!(parsed.get("HINT"), None);
        assert_eq!(parsed.get_or("HINT", "No hint provided."), "No hint provided.");
    }

    #[test]
    fn test_empty_section_falls_back() {
        let parsed = parser().parse("QUESTION:\nHINT: here");
        assert_eq!(parsed.get("QUESTION"), None);
        assert_eq!(
            parsed.get_or("QUESTION", "No question provided."),
            "No question provided."
        );
    }

    #[test]
    fn test_preamble_before_first_header_is_dropped() {
        let parsed = parser().parse("Sure! Here you go:\nQUESTION: Real content.");
        assert_eq!(parsed.get("QUESTION"), Some("Real content."));
    }

    #[test]
    fn test_unknown_headers_stay_inside_sections() {
        let parsed = parser().parse("QUESTION: A?\nNOTE: kept as question body\nHINT: B.");
        assert_eq!(parsed.get("QUESTION"), Some("A?\nNOTE: kept as question body"));
    }

    #[test]
    fn test_header_lookup_tolerates_colon() {
        let parsed = parser().parse("QUESTION: A?");
        assert_eq!(parsed.get("QUESTION:"), Some("A?"));
    }
}
