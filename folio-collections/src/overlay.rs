//! Pending add/update/remove bookkeeping shared by the editable collections.

use folio_data::{DataProvider, DataResult};
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Insertion-ordered set of entities keyed by identity.
pub struct Bucket<K, T> {
    entries: VecDeque<(K, T)>,
}

impl<K: Eq, T> Bucket<K, T> {
    fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    /// Entity at insertion (or sorted) position `index`.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|(_, entity)| entity)
    }

    /// Key and entity at position `index`.
    pub fn entry_at(&self, index: usize) -> Option<(&K, &T)> {
        self.entries.get(index).map(|(key, entity)| (key, entity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, entity)| entity)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn push(&mut self, key: K, entity: T) {
        self.entries.push_back((key, entity));
    }

    /// Insert after every entry that does not sort after `entity`.
    fn insert_sorted(&mut self, key: K, entity: T, cmp: impl Fn(&T, &T) -> Ordering) {
        let pos = self
            .entries
            .partition_point(|(_, existing)| cmp(existing, &entity) != Ordering::Greater);
        self.entries.insert(pos, (key, entity));
    }

    fn take(&mut self, key: &K) -> Option<T> {
        let pos = self.position(key)?;
        self.entries.remove(pos).map(|(_, entity)| entity)
    }

    /// Replace in place, keeping the position. Returns false when absent.
    fn replace(&mut self, key: &K, entity: T) -> bool {
        match self.position(key) {
            Some(pos) => {
                self.entries[pos].1 = entity;
                true
            }
            None => false,
        }
    }

    fn resort(&mut self, cmp: impl Fn(&T, &T) -> Ordering) {
        self.entries.make_contiguous().sort_by(|(_, a), (_, b)| cmp(a, b));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of routing an addition through the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addition {
    /// The entity is new and pending persistence.
    Pending,
    /// The entity was pending removal; the removal is cancelled and the
    /// entity is kept as a pending update.
    Restored,
    /// The entity already had a pending update, which it replaces.
    Updated,
}

/// Outcome of routing a removal through the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entity was only pending addition; it is forgotten.
    Discarded,
    /// The entity is now pending removal from the backend.
    Pending,
}

/// Three mutually exclusive buckets of uncommitted changes.
///
/// A key lives in at most one bucket. Moving a key between buckets always
/// takes it out of its previous bucket first.
pub struct Overlay<K, T> {
    added: Bucket<K, T>,
    updated: Bucket<K, T>,
    removed: Bucket<K, T>,
}

impl<K: Eq, T> Default for Overlay<K, T> {
    fn default() -> Self {
        Self {
            added: Bucket::new(),
            updated: Bucket::new(),
            removed: Bucket::new(),
        }
    }
}

impl<K: Eq, T> Overlay<K, T> {
    pub fn added(&self) -> &Bucket<K, T> {
        &self.added
    }

    pub fn updated(&self) -> &Bucket<K, T> {
        &self.updated
    }

    pub fn removed(&self) -> &Bucket<K, T> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Route an addition using insertion order for the added bucket.
    pub(crate) fn add(&mut self, key: K, entity: T) -> Addition {
        self.route_add(key, entity, |bucket, key, entity| bucket.push(key, entity))
    }

    /// Route an addition keeping the added bucket ordered by `cmp`.
    pub(crate) fn add_sorted(
        &mut self,
        key: K,
        entity: T,
        cmp: impl Fn(&T, &T) -> Ordering,
    ) -> Addition {
        self.route_add(key, entity, |bucket, key, entity| {
            bucket.insert_sorted(key, entity, cmp)
        })
    }

    fn route_add(
        &mut self,
        key: K,
        entity: T,
        insert: impl FnOnce(&mut Bucket<K, T>, K, T),
    ) -> Addition {
        if self.removed.take(&key).is_some() {
            self.mark_updated(key, entity);
            return Addition::Restored;
        }
        if self.updated.contains(&key) {
            self.mark_updated(key, entity);
            return Addition::Updated;
        }
        self.added.take(&key);
        insert(&mut self.added, key, entity);
        Addition::Pending
    }

    /// Route a removal. The caller has already checked that the entity is
    /// either pending or present in the backend-visible collection.
    pub(crate) fn remove(&mut self, key: K, entity: T) -> Removal {
        if self.added.take(&key).is_some() {
            return Removal::Discarded;
        }
        self.updated.take(&key);
        if !self.removed.contains(&key) {
            self.removed.push(key, entity);
        }
        Removal::Pending
    }

    /// Replace a pending addition in place. Returns false when not pending.
    pub(crate) fn replace_added(&mut self, key: &K, entity: T) -> bool {
        self.added.replace(key, entity)
    }

    pub(crate) fn take_added(&mut self, key: &K) -> Option<T> {
        self.added.take(key)
    }

    /// Record a modification of a backend entity, replacing any earlier one.
    pub(crate) fn mark_updated(&mut self, key: K, entity: T) {
        if let Some(pos) = self.updated.position(&key) {
            self.updated.entries[pos].1 = entity;
        } else {
            self.updated.push(key, entity);
        }
    }

    pub(crate) fn resort_added(&mut self, cmp: impl Fn(&T, &T) -> Ordering) {
        self.added.resort(cmp);
    }

    pub(crate) fn clear(&mut self) {
        self.added.clear();
        self.updated.clear();
        self.removed.clear();
    }

    /// Flush pending changes to the backend: removals, then updates, then
    /// additions.
    ///
    /// Each entry leaves its bucket only once the backend accepted it, so a
    /// failure leaves the failed entry and everything after it pending.
    /// `saved` receives the entity returned by `merge` or `persist`.
    pub(crate) fn flush(
        &mut self,
        provider: &dyn DataProvider<T>,
        mut saved: impl FnMut(&K, T),
    ) -> DataResult<FlushStats> {
        let mut stats = FlushStats::default();
        let result = self.flush_into(provider, &mut saved, &mut stats);
        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                removed = stats.removed,
                updated = stats.updated,
                added = stats.added,
                pending_removed = self.removed.len(),
                pending_updated = self.updated.len(),
                pending_added = self.added.len(),
                "flush interrupted"
            );
        }
        result.map(|_| stats)
    }

    fn flush_into(
        &mut self,
        provider: &dyn DataProvider<T>,
        saved: &mut impl FnMut(&K, T),
        stats: &mut FlushStats,
    ) -> DataResult<()> {
        while let Some((_, entity)) = self.removed.entries.front() {
            provider.remove(entity)?;
            self.removed.entries.pop_front();
            stats.removed += 1;
        }
        while let Some((key, entity)) = self.updated.entries.front() {
            let merged = provider.merge(entity)?;
            saved(key, merged);
            self.updated.entries.pop_front();
            stats.updated += 1;
        }
        while let Some((key, entity)) = self.added.entries.front() {
            let persisted = provider.persist(entity)?;
            saved(key, persisted);
            self.added.entries.pop_front();
            stats.added += 1;
        }
        Ok(())
    }
}

/// Number of entries applied by a flush, per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub removed: usize,
    pub updated: usize,
    pub added: usize,
}

impl FlushStats {
    pub fn total(&self) -> usize {
        self.removed + self.updated + self.added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_data::{DataError, SortKey};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_on: Option<u32>,
    }

    impl Recorder {
        fn record(&self, op: &str, entity: u32) -> DataResult<()> {
            if self.fail_on == Some(entity) {
                return Err(DataError::Other(format!("{op} {entity} rejected")));
            }
            self.calls
                .lock()
                .map_err(|e| DataError::Other(e.to_string()))?
                .push(format!("{op} {entity}"));
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DataProvider<u32> for Recorder {
        fn fetch(&self, _offset: usize, _count: usize, _sort: &[SortKey]) -> DataResult<Vec<u32>> {
            Ok(Vec::new())
        }

        fn count(&self) -> DataResult<usize> {
            Ok(0)
        }

        fn persist(&self, entity: &u32) -> DataResult<u32> {
            self.record("persist", *entity).map(|_| *entity)
        }

        fn merge(&self, entity: &u32) -> DataResult<u32> {
            self.record("merge", *entity).map(|_| *entity)
        }

        fn remove(&self, entity: &u32) -> DataResult<()> {
            self.record("remove", *entity)
        }
    }

    fn buckets(overlay: &Overlay<u32, u32>) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
        (
            overlay.added().keys().copied().collect(),
            overlay.updated().keys().copied().collect(),
            overlay.removed().keys().copied().collect(),
        )
    }

    #[test]
    fn test_remove_of_pending_addition_is_discarded() {
        let mut overlay = Overlay::default();
        assert_eq!(overlay.add(1, 1), Addition::Pending);
        assert_eq!(overlay.remove(1, 1), Removal::Discarded);
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_readd_after_remove_restores_as_update() {
        let mut overlay = Overlay::default();
        overlay.mark_updated(7, 7);
        assert_eq!(overlay.remove(7, 7), Removal::Pending);
        assert_eq!(buckets(&overlay), (vec![], vec![], vec![7]));
        assert_eq!(overlay.add(7, 7), Addition::Restored);
        assert_eq!(buckets(&overlay), (vec![], vec![7], vec![]));
    }

    #[test]
    fn test_keys_live_in_one_bucket() {
        let mut overlay = Overlay::default();
        overlay.mark_updated(2, 2);
        assert_eq!(overlay.add(2, 20), Addition::Updated);
        assert_eq!(overlay.updated().get(&2), Some(&20));
        overlay.remove(2, 20);
        overlay.remove(2, 20);
        assert_eq!(buckets(&overlay), (vec![], vec![], vec![2]));
    }

    #[test]
    fn test_sorted_additions_keep_insertion_order_on_ties() {
        let mut overlay = Overlay::default();
        let by_parity = |a: &u32, b: &u32| (a % 2).cmp(&(b % 2));
        overlay.add_sorted(3, 3, by_parity);
        overlay.add_sorted(2, 2, by_parity);
        overlay.add_sorted(5, 5, by_parity);
        overlay.add_sorted(4, 4, by_parity);
        assert_eq!(buckets(&overlay).0, vec![2, 4, 3, 5]);
        overlay.resort_added(|a, b| b.cmp(a));
        assert_eq!(buckets(&overlay).0, vec![5, 4, 3, 2]);
    }

    #[test]
    fn test_flush_order_and_saved_callback() {
        let provider = Recorder::default();
        let mut overlay = Overlay::default();
        overlay.add(1, 1);
        overlay.mark_updated(2, 2);
        overlay.remove(3, 3);
        let mut saved = Vec::new();
        let stats = overlay.flush(&provider, |k, _| saved.push(*k)).unwrap();
        assert_eq!(provider.calls(), vec!["remove 3", "merge 2", "persist 1"]);
        assert_eq!(saved, vec![2, 1]);
        assert_eq!(stats.total(), 3);
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_failed_flush_keeps_remainder() {
        let provider = Recorder {
            fail_on: Some(5),
            ..Recorder::default()
        };
        let mut overlay = Overlay::default();
        overlay.mark_updated(4, 4);
        overlay.mark_updated(5, 5);
        overlay.add(6, 6);
        assert!(overlay.flush(&provider, |_, _| {}).is_err());
        assert_eq!(provider.calls(), vec!["merge 4"]);
        assert_eq!(buckets(&overlay), (vec![6], vec![5], vec![]));
    }
}
