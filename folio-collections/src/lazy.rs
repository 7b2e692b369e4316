//! Lazily paged virtual list.

use crate::cache::PageCache;
use crate::config::ListConfig;
use crate::listener::{ListEvent, ListenerId, Listeners};
use crate::view::ListView;
use folio_data::{DataError, DataProvider, DataResult, KeyGenerator, Order, SortKey};
use std::sync::Arc;

/// A read-mostly list over a backend result that is fetched page by page.
///
/// `get(i)` loads the page holding `i` on first access and serves later reads
/// from the [`PageCache`]. The row count is queried once and memoized until
/// [`clear_cache`](Self::clear_cache). Ordering is delegated to the backend:
/// [`sort`](Self::sort) only stores the keys and drops cached pages.
///
/// ```ignore
/// let mut list = LazyList::new(provider, StorableKeyGenerator, &ListConfig::new(50, 10));
/// list.sort(&["name"], &[Order::Ascending]);
/// for person in list.iter() {
///     println!("{}", person?.name);
/// }
/// ```
pub struct LazyList<T, G: KeyGenerator<T>> {
    provider: Arc<dyn DataProvider<T>>,
    keys: G,
    cache: PageCache<T, G::Key>,
    size: Option<usize>,
    sort: Vec<SortKey>,
    listeners: Listeners,
}

impl<T: Clone, G: KeyGenerator<T>> LazyList<T, G> {
    pub fn new(provider: impl DataProvider<T> + 'static, keys: G, config: &ListConfig) -> Self {
        Self::from_arc(Arc::new(provider), keys, config)
    }

    /// Build over a provider that is shared with other collections.
    pub fn from_arc(provider: Arc<dyn DataProvider<T>>, keys: G, config: &ListConfig) -> Self {
        Self {
            provider,
            keys,
            cache: PageCache::new(config.page_size, config.max_pages),
            size: None,
            sort: Vec::new(),
            listeners: Listeners::default(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider<T>> {
        &self.provider
    }

    pub fn key_generator(&self) -> &G {
        &self.keys
    }

    pub fn key_of(&self, entity: &T) -> G::Key {
        self.keys.generate(entity)
    }

    pub fn page_cache(&self) -> &PageCache<T, G::Key> {
        &self.cache
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    /// Backend row count, memoized until the next explicit cache clear.
    pub fn size(&mut self) -> DataResult<usize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self.provider.count()?;
        tracing::debug!(size, "row count queried");
        self.size = Some(size);
        Ok(size)
    }

    pub fn get(&mut self, index: usize) -> DataResult<T> {
        let size = self.size()?;
        if index >= size {
            return Err(DataError::out_of_range(index, size));
        }
        let page_size = self.cache.page_size();
        let (number, offset) = (index / page_size, index % page_size);

        if let Some(page) = self.cache.get(number) {
            tracing::trace!(index, page = number, "page cache hit");
            return page
                .get(offset)
                .cloned()
                .ok_or_else(|| DataError::out_of_range(index, size));
        }

        let (page, drift) = self
            .cache
            .load(number, self.provider.as_ref(), &self.sort, &self.keys)?;
        let entity = page.get(offset).cloned();
        if drift {
            self.listeners.fire(ListEvent::Drift);
        }
        // A short page means the backend shrank since the count was taken.
        entity.ok_or_else(|| DataError::out_of_range(index, size))
    }

    /// Position of `entity`, matched by identity key.
    ///
    /// Tries the reverse index, then the cached pages, then scans the whole
    /// list through [`get`](Self::get).
    pub fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>> {
        let key = self.keys.generate(entity);
        if let Some(index) = self.cache.indexed(&key) {
            return Ok(Some(index));
        }
        if let Some(index) = self.cache.find_cached(&key) {
            return Ok(Some(index));
        }
        let size = self.size()?;
        for index in 0..size {
            let candidate = self.get(index)?;
            if self.keys.generate(&candidate) == key {
                self.cache.remember(key, index);
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn contains(&mut self, entity: &T) -> DataResult<bool> {
        if self.cache.is_known(&self.keys.generate(entity)) {
            return Ok(true);
        }
        Ok(self.index_of(entity)?.is_some())
    }

    /// Apply new sort keys, drop cached pages and notify listeners.
    ///
    /// Names and directions are paired positionally; extra entries on either
    /// side are ignored.
    pub fn sort<S: AsRef<str>>(&mut self, property_names: &[S], orders: &[Order]) {
        self.sort_by_keys(SortKey::zip(property_names, orders));
    }

    pub fn sort_by_keys(&mut self, keys: Vec<SortKey>) {
        tracing::debug!(keys = ?keys, "sort keys changed");
        self.sort = keys;
        self.cache.invalidate_all();
        self.listeners.fire(ListEvent::Sorted);
    }

    /// Drop all cached pages and the memoized row count.
    pub fn clear_cache(&mut self) {
        self.cache.invalidate_all();
        self.size = None;
        self.listeners.fire(ListEvent::Cleared);
    }

    pub fn add_listener(&mut self, listener: impl FnMut(ListEvent) + Send + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn invalidate_index(&mut self) {
        self.cache.invalidate_index();
    }

    pub(crate) fn notify(&mut self, event: ListEvent) {
        self.listeners.fire(event);
    }
}

impl<T: Clone, G: KeyGenerator<T>> ListView<T> for LazyList<T, G> {
    fn size(&mut self) -> DataResult<usize> {
        LazyList::size(self)
    }

    fn get(&mut self, index: usize) -> DataResult<T> {
        LazyList::get(self, index)
    }

    fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>> {
        LazyList::index_of(self, entity)
    }

    fn contains(&mut self, entity: &T) -> DataResult<bool> {
        LazyList::contains(self, entity)
    }
}
