/*!
 * Translation map with first-write-wins merging.
 */

use std::collections::BTreeMap;

/// Translated text keyed by caption index.
///
/// An index is set at most once. When overlap offers the same index again, the
/// earlier batch's text stays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    entries: BTreeMap<usize, String>,
}

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the index is already translated; returns whether it was inserted
    pub fn insert_first(&mut self, index: usize, text: impl Into<String>) -> bool {
        if self.entries.contains_key(&index) {
            return false;
        }
        self.entries.insert(index, text.into());
        true
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices from `wanted` that have no translation
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a usize>) -> Vec<usize> {
        wanted.into_iter().copied().filter(|i| !self.contains(*i)).collect()
    }
}
