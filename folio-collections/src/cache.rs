//! Bounded page cache with drift detection.

use crate::page::Page;
use folio_data::{DataProvider, DataResult, KeyGenerator, SortKey};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

struct CachedPage<T, K> {
    page: Page<T>,
    keys: Vec<K>,
}

/// Bounded set of fetched pages, kept in ascending page-number order.
///
/// Alongside the pages the cache tracks the identity keys of every cached
/// entity (the "known" set) and a best-effort reverse index from key to
/// global position. The reverse index may be dropped at any time; it only
/// saves scans.
pub struct PageCache<T, K> {
    page_size: usize,
    max_pages: usize,
    pages: Vec<CachedPage<T, K>>,
    known: HashSet<K>,
    index: HashMap<K, usize>,
    loads: usize,
}

impl<T, K: Eq + Hash + Clone> PageCache<T, K> {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
            pages: Vec::new(),
            known: HashSet::new(),
            index: HashMap::new(),
            loads: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Number of pages currently cached.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of backend fetches performed by this cache.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        self.pages.iter().map(|cached| cached.page.number()).collect()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page<T>> {
        self.pages.iter().map(|cached| &cached.page)
    }

    pub fn get(&self, number: usize) -> Option<&Page<T>> {
        self.position(number).ok().map(|pos| &self.pages[pos].page)
    }

    /// Fetch page `number` from the backend and cache it.
    ///
    /// Returns the page and whether drift was detected. Drift means a fetched
    /// entity was already present in another cached page, so backend offsets
    /// must have shifted; in that case every other page is dropped before the
    /// new one is inserted.
    pub fn load<G>(
        &mut self,
        number: usize,
        provider: &dyn DataProvider<T>,
        sort: &[SortKey],
        keys: &G,
    ) -> DataResult<(&Page<T>, bool)>
    where
        G: KeyGenerator<T, Key = K>,
    {
        let content = provider.fetch(number * self.page_size, self.page_size, sort)?;
        self.loads += 1;
        tracing::debug!(page = number, rows = content.len(), "page loaded");

        if let Ok(stale) = self.position(number) {
            self.remove_at(stale);
        }

        let fetched: Vec<K> = content.iter().map(|e| keys.generate(e)).collect();
        let drift = fetched.iter().any(|key| self.known.contains(key));
        if drift {
            tracing::warn!(
                page = number,
                cached = self.pages.len(),
                "backend drift detected, invalidating page cache"
            );
            self.invalidate_all();
        }
        self.known.extend(fetched.iter().cloned());

        let pos = match self.position(number) {
            Ok(pos) | Err(pos) => pos,
        };
        self.pages.insert(
            pos,
            CachedPage {
                page: Page::new(number, content),
                keys: fetched,
            },
        );
        let pos = self.balance(pos);
        Ok((&self.pages[pos].page, drift))
    }

    /// Evict one page if over capacity, returning the new position of `inserted`.
    fn balance(&mut self, inserted: usize) -> usize {
        if self.pages.len() <= self.max_pages {
            return inserted;
        }
        let near_start = inserted < self.pages.len() / 2;
        self.evict_one_from_end(near_start);
        if near_start {
            inserted
        } else {
            inserted - 1
        }
    }

    /// Evict the last page when `near_start`, otherwise the first one.
    ///
    /// Returns the evicted page number.
    pub fn evict_one_from_end(&mut self, near_start: bool) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        let pos = if near_start { self.pages.len() - 1 } else { 0 };
        let number = self.remove_at(pos);
        tracing::debug!(page = number, "page evicted");
        Some(number)
    }

    pub fn invalidate_all(&mut self) {
        self.pages.clear();
        self.known.clear();
        self.index.clear();
    }

    /// Drop only the reverse index.
    pub fn invalidate_index(&mut self) {
        self.index.clear();
    }

    /// Whether an entity with this key sits in one of the cached pages.
    pub fn is_known(&self, key: &K) -> bool {
        self.known.contains(key)
    }

    pub fn indexed(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn remember(&mut self, key: K, index: usize) {
        self.index.insert(key, index);
    }

    /// Scan cached pages for `key`, recording a hit in the reverse index.
    pub fn find_cached(&mut self, key: &K) -> Option<usize> {
        if !self.known.contains(key) {
            return None;
        }
        let page_size = self.page_size;
        let found = self.pages.iter().find_map(|cached| {
            cached
                .keys
                .iter()
                .position(|k| k == key)
                .map(|offset| cached.page.offset(page_size) + offset)
        })?;
        self.index.insert(key.clone(), found);
        Some(found)
    }

    fn position(&self, number: usize) -> Result<usize, usize> {
        self.pages
            .binary_search_by_key(&number, |cached| cached.page.number())
    }

    fn remove_at(&mut self, pos: usize) -> usize {
        let cached = self.pages.remove(pos);
        for key in &cached.keys {
            self.known.remove(key);
            self.index.remove(key);
        }
        cached.page.number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_data::{DataError, KeyFn};
    use std::sync::Mutex;

    struct Rows {
        rows: Mutex<Vec<u32>>,
    }

    impl Rows {
        fn new(count: u32) -> Self {
            Self {
                rows: Mutex::new((0..count).collect()),
            }
        }
    }

    impl DataProvider<u32> for Rows {
        fn fetch(&self, offset: usize, count: usize, _sort: &[SortKey]) -> DataResult<Vec<u32>> {
            let rows = self.rows.lock().map_err(|e| DataError::Other(e.to_string()))?;
            Ok(rows.iter().skip(offset).take(count).copied().collect())
        }

        fn count(&self) -> DataResult<usize> {
            Ok(self.rows.lock().map_err(|e| DataError::Other(e.to_string()))?.len())
        }

        fn persist(&self, entity: &u32) -> DataResult<u32> {
            Ok(*entity)
        }

        fn merge(&self, entity: &u32) -> DataResult<u32> {
            Ok(*entity)
        }

        fn remove(&self, _entity: &u32) -> DataResult<()> {
            Ok(())
        }
    }

    fn identity() -> impl KeyGenerator<u32, Key = u32> {
        KeyFn::new(|v: &u32| *v)
    }

    #[test]
    fn test_forward_reads_evict_first_page() {
        let rows = Rows::new(10);
        let keys = identity();
        let mut cache = PageCache::new(2, 2);
        cache.load(0, &rows, &[], &keys).unwrap();
        cache.load(1, &rows, &[], &keys).unwrap();
        cache.load(2, &rows, &[], &keys).unwrap();
        assert_eq!(cache.page_numbers(), vec![1, 2]);
        assert!(!cache.is_known(&0));
        assert!(cache.is_known(&4));
    }

    #[test]
    fn test_backward_reads_evict_last_page() {
        let rows = Rows::new(10);
        let keys = identity();
        let mut cache = PageCache::new(2, 2);
        cache.load(4, &rows, &[], &keys).unwrap();
        cache.load(3, &rows, &[], &keys).unwrap();
        let (page, drift) = cache.load(2, &rows, &[], &keys).unwrap();
        assert_eq!(page.number(), 2);
        assert!(!drift);
        assert_eq!(cache.page_numbers(), vec![2, 3]);
    }

    #[test]
    fn test_single_page_capacity_keeps_newest() {
        let rows = Rows::new(10);
        let keys = identity();
        let mut cache = PageCache::new(3, 1);
        cache.load(2, &rows, &[], &keys).unwrap();
        cache.load(0, &rows, &[], &keys).unwrap();
        assert_eq!(cache.page_numbers(), vec![0]);
    }

    #[test]
    fn test_overlap_is_drift() {
        let rows = Rows::new(10);
        let keys = identity();
        let mut cache = PageCache::new(2, 4);
        cache.load(0, &rows, &[], &keys).unwrap();
        cache.load(1, &rows, &[], &keys).unwrap();
        // Simulate a delete at the front: offsets shift by one.
        rows.rows.lock().unwrap().remove(0);
        let (page, drift) = cache.load(2, &rows, &[], &keys).unwrap();
        assert_eq!(page.content(), &[5, 6]);
        assert!(!drift);
        rows.rows.lock().unwrap().insert(0, 100);
        rows.rows.lock().unwrap().insert(0, 101);
        let (_, drift) = cache.load(3, &rows, &[], &keys).unwrap();
        assert!(drift);
        assert_eq!(cache.page_numbers(), vec![3]);
    }

    #[test]
    fn test_reverse_index_dropped_on_eviction() {
        let rows = Rows::new(10);
        let keys = identity();
        let mut cache = PageCache::new(2, 2);
        cache.load(0, &rows, &[], &keys).unwrap();
        assert_eq!(cache.find_cached(&1), Some(1));
        assert_eq!(cache.indexed(&1), Some(1));
        cache.load(1, &rows, &[], &keys).unwrap();
        cache.load(2, &rows, &[], &keys).unwrap();
        assert_eq!(cache.indexed(&1), None);
        assert_eq!(cache.load_count(), 3);
    }
}
