//! Cache of parsed content keyed by file identity.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{FileIdentity, ParsedContent};

/// Maps each file identity to its latest parse.
///
/// Ordered so that working sets and full-store iterations are deterministic.
#[derive(Debug, Default, Clone)]
pub struct ContentStore {
    entries: BTreeMap<FileIdentity, Arc<ParsedContent>>,
}

impl ContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `content.identity`, returning the old one.
    pub fn insert(&mut self, content: ParsedContent) -> Option<Arc<ParsedContent>> {
        let content = Arc::new(content);
        self.entries.insert(content.identity.clone(), content)
    }

    /// Remove the entry for `id`.
    pub fn remove(&mut self, id: &FileIdentity) -> Option<Arc<ParsedContent>> {
        self.entries.remove(id)
    }

    /// Get the entry for `id`.
    #[must_use]
    pub fn get(&self, id: &FileIdentity) -> Option<Arc<ParsedContent>> {
        self.entries.get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &FileIdentity) -> bool {
        self.entries.contains_key(id)
    }

    /// Every identity in the store, ordered.
    pub fn identities(&self) -> impl Iterator<Item = &FileIdentity> {
        self.entries.keys()
    }

    /// Every entry in the store, ordered by identity.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<ParsedContent>> {
        self.entries.values().cloned().collect()
    }

    /// Entries for the given identities that the store holds, in identity order.
    ///
    /// Identities the store does not know are skipped.
    #[must_use]
    pub fn select<'a>(&self, ids: impl IntoIterator<Item = &'a FileIdentity>) -> Vec<Arc<ParsedContent>> {
        let mut selected: Vec<_> = ids.into_iter().filter_map(|id| self.get(id)).collect();
        selected.sort_by(|a, b| a.identity.cmp(&b.identity));
        selected.dedup_by(|a, b| a.identity == b.identity);
        selected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
