//! Word tokenizer for page and PDF text

use std::sync::OnceLock;

use regex::Regex;

use super::stopwords::StopwordSet;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    // Letter runs, optionally joined by internal apostrophes ("don't", "d'água").
    WORD.get_or_init(|| Regex::new(r"\p{L}+(?:['’]\p{L}+)*").expect("valid word regex"))
}

/// Strip surrounding punctuation and whitespace and lowercase the token
pub fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase()
}

/// Tokenizer producing lowercase, filtered word tokens
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    stopwords: &'a StopwordSet,
}

impl Default for Tokenizer<'static> {
    fn default() -> Self {
        Self::new(StopwordSet::shared())
    }
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer filtering against the given stopword set
    pub fn new(stopwords: &'a StopwordSet) -> Self {
        Self { stopwords }
    }

    /// Split text into kept tokens, in original order, duplicates included
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        word_regex()
            .find_iter(text)
            .filter_map(|m| self.accept(m.as_str()))
            .collect()
    }

    fn accept(&self, candidate: &str) -> Option<String> {
        let token = normalize_token(candidate);
        if token.is_empty()
            || token.chars().any(char::is_numeric)
            || token.chars().count() <= 1
            || self.stopwords.contains(&token)
        {
            return None;
        }
        Some(token)
    }
}

/// Tokenize text with the standard stopword set
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}
