//! Per-call copies of the entry collection.

use crate::entry::Entry;
use bibfmt_citeproc::ItemCallback;
use std::collections::HashMap;

/// An owned copy of the entries, taken at the start of a `get` call.
///
/// Nothing done to the snapshot (or to item data handed to the engine)
/// reaches the caller's collection.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<Entry>,
    /// Id to position of its first occurrence.
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn capture(entries: &[Entry]) -> Snapshot {
        let entries = entries.to_vec();
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if let Some(id) = entry.id() {
                index.entry(id).or_insert(position);
            }
        }
        Snapshot { entries, index }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in collection order. Entries without an id are skipped.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().filter_map(Entry::id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    /// Item lookup for the citation engine. Each call hands out a fresh copy.
    pub fn item_callback(&self) -> ItemCallback<'_> {
        Box::new(move |id: &str| self.get(id).map(|entry| entry.fields().clone()))
    }
}
