use std::collections::HashMap;

/// Resolved locations for the lifetime of a run, keyed by normalized city
///
/// Entries are never expired or refreshed; the first value stored for a key
/// is the one every later lookup sees.
#[derive(Debug, Clone, Default)]
pub struct LocationCache {
    entries: HashMap<String, String>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a value unless the key is already present, returning the cached value
    pub fn insert(&mut self, key: String, value: String) -> &str {
        self.entries.entry(key).or_insert(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
