use std::collections::btree_map::{BTreeMap, Entry};

use crate::Item;

/// Everything visible in one queue as of its last successful fetch.
/// Holds at most one item per id; iteration is ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    items: BTreeMap<String, Item>,
}

impl QueueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item, replacing any item with the same id.
    /// Returns the replaced item so callers can report duplicates.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        match self.items.entry(item.id.clone()) {
            Entry::Occupied(mut slot) => Some(slot.insert(item)),
            Entry::Vacant(slot) => {
                slot.insert(item);
                None
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

impl FromIterator<Item> for QueueSnapshot {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut snapshot = QueueSnapshot::new();
        for item in iter {
            snapshot.insert(item);
        }
        snapshot
    }
}

impl IntoIterator for QueueSnapshot {
    type Item = Item;
    type IntoIter = std::collections::btree_map::IntoValues<String, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

/// Items of `current` whose id is absent from `previous`, ordered by id.
///
/// There is no tombstone memory: an item that left the queue and came back is
/// new again.
pub fn diff(previous: &QueueSnapshot, current: &QueueSnapshot) -> Vec<Item> {
    current
        .iter()
        .filter(|item| !previous.contains(&item.id))
        .cloned()
        .collect()
}
