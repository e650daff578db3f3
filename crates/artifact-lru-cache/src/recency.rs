//! Recency ordering of cached artifacts

use lru::LruCache;
use std::hash::Hash;

/// Artifact ids ordered from most- to least-recently used, without duplicates.
pub struct RecencyList<K: Hash + Eq> {
    order: LruCache<K, ()>,
}

impl<K: Hash + Eq + Clone> RecencyList<K> {
    pub fn new() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }

    /// Rebuild from a most-recent-first sequence. Repeated ids keep the
    /// position of their first (most recent) occurrence.
    pub fn from_ordered(ids: impl IntoIterator<Item = K>) -> Self {
        let ids: Vec<K> = ids.into_iter().collect();
        let mut list = Self::new();
        for id in ids.into_iter().rev() {
            list.order.push(id, ());
        }
        list
    }

    pub fn contains(&self, id: &K) -> bool {
        self.order.contains(id)
    }

    /// Move a known id to the front. Returns `false` if the id is unknown.
    pub fn promote(&mut self, id: &K) -> bool {
        if !self.order.contains(id) {
            return false;
        }
        self.order.promote(id);
        true
    }

    /// Insert a new id at the front. No-op returning `false` if already present.
    pub fn append(&mut self, id: K) -> bool {
        if self.order.contains(&id) {
            return false;
        }
        self.order.push(id, ());
        true
    }

    /// Remove and return the least-recently-used id, `None` when empty
    pub fn pop_least_recent(&mut self) -> Option<K> {
        self.order.pop_lru().map(|(id, ())| id)
    }

    pub fn remove(&mut self, id: &K) -> bool {
        self.order.pop(id).is_some()
    }

    /// Ids in most-recent-first order
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|(id, ())| id)
    }

    pub fn snapshot(&self) -> Vec<K> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K: Hash + Eq + Clone> Default for RecencyList<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_puts_new_ids_first() {
        let mut list = RecencyList::new();
        assert!(list.append(1));
        assert!(list.append(2));
        assert!(list.append(3));
        assert_eq!(list.snapshot(), vec![3, 2, 1]);
    }

    #[test]
    fn test_append_existing_is_noop() {
        let mut list = RecencyList::new();
        list.append(1);
        list.append(2);
        assert!(!list.append(1));
        assert_eq!(list.snapshot(), vec![2, 1]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_promote() {
        let mut list = RecencyList::from_ordered(vec![3, 2, 1]);
        assert!(list.promote(&1));
        assert_eq!(list.snapshot(), vec![1, 3, 2]);

        assert!(!list.promote(&42));
        assert_eq!(list.snapshot(), vec![1, 3, 2]);
    }

    #[test]
    fn test_pop_least_recent() {
        let mut list = RecencyList::from_ordered(vec!["c", "b", "a"]);
        assert_eq!(list.pop_least_recent(), Some("a"));
        assert_eq!(list.pop_least_recent(), Some("b"));
        assert_eq!(list.pop_least_recent(), Some("c"));
        assert_eq!(list.pop_least_recent(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_from_ordered_collapses_duplicates() {
        let list = RecencyList::from_ordered(vec![5, 7, 5, 9, 7]);
        assert_eq!(list.snapshot(), vec![5, 7, 9]);
    }

    #[test]
    fn test_remove() {
        let mut list = RecencyList::from_ordered(vec![1, 2, 3]);
        assert!(list.remove(&2));
        assert!(!list.remove(&2));
        assert_eq!(list.snapshot(), vec![1, 3]);
    }
}
