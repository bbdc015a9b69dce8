//! Stopword filtering
//!
//! The standard set is the union of the English and Portuguese lists from the
//! `stop-words` crate and a hand-curated list of devopsdays site furniture.

use std::collections::HashSet;
use std::sync::OnceLock;

use stop_words::{LANGUAGE, get};

/// Terms that appear on every event page and carry no topical signal
pub const DOMAIN_STOPWORDS: &[&str] = &[
    "devopsdays",
    "event",
    "events",
    "program",
    "www",
    "http",
    "https",
    "a",
    "the",
    "contact",
    "presentations",
    "blog",
    "welcome",
    "reactions",
    "speakers",
    "participants",
    "intro",
    "video",
    "slideshare",
    "for",
    "with",
    "in",
    "and",
    "not",
    "only",
    "ppt",
    "pdf",
    "detail",
    "non",
    "do",
    "is",
    "all",
    "so",
    "how",
    "t",
    "of",
    "to",
    "an",
];

/// A case-insensitive set of words excluded from tokenized output
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    /// Stopwords, trimmed and lowercased
    words: HashSet<String>,
}

impl StopwordSet {
    /// English, Portuguese and domain stopwords
    pub fn standard() -> Self {
        let mut set = Self::default();
        for language in [LANGUAGE::English, LANGUAGE::Portuguese] {
            set.extend(get(language).iter().map(|s| s.to_string()));
        }
        set.extend(DOMAIN_STOPWORDS.iter().map(|s| s.to_string()));
        set
    }

    /// Shared standard set, built on first use
    pub fn shared() -> &'static StopwordSet {
        static STANDARD: OnceLock<StopwordSet> = OnceLock::new();
        STANDARD.get_or_init(Self::standard)
    }

    /// Create a stopword set from a custom list
    pub fn from_list(words: &[&str]) -> Self {
        let mut set = Self::default();
        set.extend(words.iter().map(|s| s.to_string()));
        set
    }

    /// Add words to the set, normalizing case and surrounding whitespace
    pub fn extend<I>(&mut self, words: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    /// Check if a word is a stopword
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Number of stopwords in the set
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_covers_both_languages() {
        let set = StopwordSet::standard();
        assert!(set.contains("the"));
        assert!(set.contains("que"));
        assert!(set.contains("DevOpsDays"));
        assert!(!set.contains("kubernetes"));
    }

    #[test]
    fn test_from_list_is_case_insensitive() {
        let set = StopwordSet::from_list(&["  Foo ", "BAR", ""]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("foo"));
        assert!(set.contains("Bar"));
    }

    #[test]
    fn test_shared_is_built_once() {
        let a = StopwordSet::shared() as *const StopwordSet;
        let b = StopwordSet::shared() as *const StopwordSet;
        assert_eq!(a, b);
        assert!(!StopwordSet::shared().is_empty());
    }
}
