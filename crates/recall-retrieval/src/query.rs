//! Focus-term extraction from raw query text.
//!
//! Purely syntactic. Three rules, unioned:
//! 1. quoted phrases,
//! 2. runs of two or more capitalized words (`Acme Water Co.`, `R&D Budget`),
//! 3. identifier-like tokens (`ISO9001`, `max_tokens`, `getUser`).

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static QUOTED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"["“]([^"“”]+)["”]"#).ok());

static CAPITALIZED_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b\p{Lu}[\p{L}\p{N}&.\-']*(?:[ \t]+\p{Lu}[\p{L}\p{N}&.\-']*)+").ok()
});

/// A lower-cased salient span of the query, with the tokens used to match it
/// against passage text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTerm {
    text: String,
    tokens: Vec<String>,
}

impl FocusTerm {
    fn new(literal: &str, min_token_len: usize) -> Self {
        let text = literal.to_lowercase();
        let mut tokens: Vec<String> = Vec::new();
        for token in text.split(|c: char| !c.is_alphanumeric()) {
            if token.chars().count() >= min_token_len && !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        Self { text, tokens }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tokens of at least the configured length.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Substring containment of every token in already lower-cased text.
    /// A term without qualifying tokens (`"AI ML"`) matches on the whole
    /// lower-cased phrase instead.
    pub fn matches(&self, lowered_text: &str) -> bool {
        if self.tokens.is_empty() {
            return !self.text.is_empty() && lowered_text.contains(self.text.as_str());
        }
        self.tokens.iter().all(|t| lowered_text.contains(t.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct QueryAnalyzer {
    min_token_len: usize,
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl QueryAnalyzer {
    pub fn new(min_token_len: usize) -> Self {
        Self { min_token_len }
    }

    /// Unique focus terms, longest literal first; ties keep query order.
    pub fn analyze(&self, query: &str) -> Vec<FocusTerm> {
        let mut spans: Vec<String> = Vec::new();

        if let Some(re) = QUOTED.as_ref() {
            for cap in re.captures_iter(query) {
                let phrase = cap[1].trim();
                if phrase.chars().count() >= self.min_token_len {
                    spans.push(phrase.to_string());
                }
            }
        }

        if let Some(re) = CAPITALIZED_RUN.as_ref() {
            for m in re.find_iter(query) {
                let span = m.as_str().trim_end_matches(|c: char| !c.is_alphanumeric());
                if span.split_whitespace().count() >= 2 {
                    spans.push(span.to_string());
                }
            }
        }

        for raw in query.split_whitespace() {
            let token = raw.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
            if token.chars().count() >= self.min_token_len && is_identifier_like(token) {
                spans.push(token.to_string());
            }
        }

        // Case-insensitive dedup keeping the longer literal and first position.
        let mut order: Vec<String> = Vec::new();
        let mut by_key: HashMap<String, String> = HashMap::new();
        for span in spans {
            let key = span.to_lowercase();
            match by_key.get_mut(&key) {
                Some(kept) => {
                    if span.chars().count() > kept.chars().count() {
                        *kept = span;
                    }
                }
                None => {
                    order.push(key.clone());
                    by_key.insert(key, span);
                }
            }
        }

        let mut literals: Vec<String> = order.into_iter().filter_map(|k| by_key.remove(&k)).collect();
        literals.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        literals.iter().map(|l| FocusTerm::new(l, self.min_token_len)).collect()
    }
}

/// Letters mixed with digits or underscores, or a lower-to-upper camel hump.
fn is_identifier_like(token: &str) -> bool {
    let has_alpha = token.chars().any(char::is_alphabetic);
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let has_underscore = token.contains('_');
    let camel = token
        .chars()
        .zip(token.chars().skip(1))
        .any(|(a, b)| a.is_lowercase() && b.is_uppercase());
    has_alpha && (has_digit || has_underscore || camel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(terms: &[FocusTerm]) -> Vec<&str> {
        terms.iter().map(FocusTerm::text).collect()
    }

    #[test]
    fn extracts_quoted_phrases() {
        let terms = QueryAnalyzer::default().analyze(r#"what does "water filter" cost and "ab""#);
        assert_eq!(texts(&terms), vec!["water filter"], "short phrases are dropped");
    }

    #[test]
    fn extracts_capitalized_runs_with_internal_punctuation() {
        let terms = QueryAnalyzer::default().analyze("who founded Acme Water Co. in 1990?");
        assert_eq!(texts(&terms), vec!["acme water co"]);

        let terms = QueryAnalyzer::default().analyze("summarize the R&D Budget please");
        assert_eq!(texts(&terms), vec!["r&d budget"]);
    }

    #[test]
    fn single_capitalized_word_is_not_a_span() {
        assert!(QueryAnalyzer::default().analyze("Where is the pump").is_empty());
    }

    #[test]
    fn extracts_identifier_like_tokens() {
        let terms = QueryAnalyzer::default().analyze("set max_tokens for getUser per ISO9001");
        assert_eq!(texts(&terms), vec!["max_tokens", "getuser", "iso9001"]);
    }

    #[test]
    fn dedups_case_insensitively_and_sorts_longest_first() {
        let terms = QueryAnalyzer::default().analyze(r#""Solar Panel" vs "solar panel" and "Solar Panel Mounts""#);
        assert_eq!(texts(&terms), vec!["solar panel mounts", "solar panel"]);
    }

    #[test]
    fn tokens_respect_min_length() {
        let terms = QueryAnalyzer::new(3).analyze(r#""AT&T of Texas""#);
        assert_eq!(terms[0].tokens(), ["texas"]);
    }

    #[test]
    fn matching_requires_every_token() {
        let term = FocusTerm::new("Rain Barrel", 3);
        assert!(term.matches("a rain-catching barrel"));
        assert!(!term.matches("a rain gauge"));
    }

    #[test]
    fn short_token_phrase_matches_verbatim() {
        let term = FocusTerm::new("AI ML", 3);
        assert!(term.tokens().is_empty());
        assert!(term.matches("notes on ai ml pipelines"));
        assert!(!term.matches("ai and ml notes"), "the phrase must appear as written");
        assert!(!FocusTerm::new("", 3).matches("anything"));
    }

    #[test]
    fn empty_query_has_no_terms() {
        assert!(QueryAnalyzer::default().analyze("").is_empty());
    }
}
