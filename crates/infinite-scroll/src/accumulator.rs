//! Ordered, identifier-deduplicated item history

use std::collections::HashSet;

use crate::ListItem;

/// Result of merging one fetched page
#[derive(Clone, Debug, PartialEq)]
pub struct Merged<T> {
    /// The page exactly as fetched, duplicates included
    pub batch: Vec<T>,
    /// Number of items that were new to the accumulator
    pub added: usize,
}

impl<T> Merged<T> {
    /// Items in the batch whose identifier was already present
    pub fn skipped(&self) -> usize {
        self.batch.len() - self.added
    }
}

/// Holds every item loaded during a session, in arrival order.
///
/// Seed items come first, then each merged page is appended. An identifier appears at
/// most once; a page that repeats an identifier does not displace the earlier item.
#[derive(Clone, Debug)]
pub struct ItemAccumulator<T: ListItem> {
    items: Vec<T>,
    seen: HashSet<T::Id>,
}

impl<T: ListItem> Default for ItemAccumulator<T> {
    fn default() -> Self {
        Self { items: Vec::new(), seen: HashSet::new() }
    }
}

impl<T: ListItem + Clone> ItemAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with seed items.
    ///
    /// Seed identifiers are trusted to be unique; they are not filtered.
    pub fn seed(&mut self, items: Vec<T>) {
        self.seen = items.iter().map(T::id).collect();
        self.items = items;
    }

    /// Append the items of `page` whose identifiers are not yet present
    pub fn merge(&mut self, page: Vec<T>) -> Merged<T> {
        let before = self.items.len();
        for item in &page {
            if self.seen.insert(item.id()) {
                self.items.push(item.clone());
            } else {
                tracing::debug!("merge: skipping duplicate id {:?}", item.id());
            }
        }
        Merged { added: self.items.len() - before, batch: page }
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.seen.contains(id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
