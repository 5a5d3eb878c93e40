//! Request-scoped set of already-used words.

use std::collections::HashSet;

use crate::language::normalize::normalize;

/// Normalized keys of words already consumed in a section, in the order they
/// were added.
///
/// Owned by a single generation run: seeded from the store, grown with each
/// accepted word, then dropped.
#[derive(Debug, Clone, Default)]
pub struct ForbiddenSet {
    order: Vec<String>,
    keys: HashSet<String>,
}

impl ForbiddenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw stored contents. Empty keys are skipped.
    pub fn from_raw<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for w in words {
            set.insert(w.as_ref());
        }
        set
    }

    /// Insert a raw word. Returns false if its key was empty or already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let key = normalize(word);
        if key.is_empty() || self.keys.contains(&key) {
            return false;
        }
        self.keys.insert(key.clone());
        self.order.push(key);
        true
    }

    /// Membership by normalized key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.contains_key(&normalize(word))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `limit` most recently added keys, oldest first.
    pub fn recent(&self, limit: usize) -> &[String] {
        &self.order[self.order.len().saturating_sub(limit)..]
    }
}
