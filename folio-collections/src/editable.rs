//! Lazy list with an uncommitted local overlay.

use crate::comparator::ReflectionComparator;
use crate::config::ListConfig;
use crate::lazy::LazyList;
use crate::listener::{ListEvent, ListenerId};
use crate::overlay::{Addition, FlushStats, Overlay, Removal};
use crate::property::Introspect;
use crate::view::ListView;
use folio_data::{DataError, DataProvider, DataResult, KeyGenerator, Order, SortKey};
use std::cmp::Ordering;
use std::sync::Arc;

/// A [`LazyList`] that accepts local additions, updates and removals.
///
/// Changes live in an [`Overlay`] until [`commit`](Self::commit). Reads
/// present one ordering: backend entities keep their backend order (with
/// pending updates substituted and pending removals skipped) and pending
/// additions are merged in by the list comparator, which is built from the
/// active sort keys. On ties the backend entity comes first, so with no sort
/// keys new entities appear after the committed ones.
pub struct EditableLazyList<T: 'static, G: KeyGenerator<T>> {
    inner: LazyList<T, G>,
    overlay: Overlay<G::Key, T>,
    comparator: ReflectionComparator<'static, T>,
}

impl<T, G> EditableLazyList<T, G>
where
    T: Introspect + Clone,
    G: KeyGenerator<T>,
{
    pub fn new(provider: impl DataProvider<T> + 'static, keys: G, config: &ListConfig) -> Self {
        Self::from_lazy(LazyList::new(provider, keys, config))
    }

    pub fn from_arc(provider: Arc<dyn DataProvider<T>>, keys: G, config: &ListConfig) -> Self {
        Self::from_lazy(LazyList::from_arc(provider, keys, config))
    }

    fn from_lazy(inner: LazyList<T, G>) -> Self {
        let comparator = ReflectionComparator::for_type(inner.sort_keys().to_vec());
        Self {
            inner,
            overlay: Overlay::default(),
            comparator,
        }
    }

    /// The backend-visible list underneath the overlay.
    pub fn lazy(&self) -> &LazyList<T, G> {
        &self.inner
    }

    pub fn overlay(&self) -> &Overlay<G::Key, T> {
        &self.overlay
    }

    pub fn is_dirty(&self) -> bool {
        !self.overlay.is_empty()
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        self.inner.sort_keys()
    }

    /// Backend size plus pending additions minus pending removals.
    pub fn size(&mut self) -> DataResult<usize> {
        let backend = self.inner.size()?;
        Ok((backend + self.overlay.added().len()).saturating_sub(self.overlay.removed().len()))
    }

    /// Stage an entity that is not yet in the backend.
    pub fn add(&mut self, entity: T) -> Addition {
        let key = self.inner.key_of(&entity);
        let comparator = &self.comparator;
        let outcome = self
            .overlay
            .add_sorted(key, entity, |a, b| comparator.compare(a, b));
        self.inner.invalidate_index();
        tracing::trace!(?outcome, "entity added to overlay");
        outcome
    }

    /// Stage a removal.
    ///
    /// Pending additions are simply forgotten. Returns `false` when the
    /// entity is neither pending nor visible in the backend collection, or
    /// is already pending removal.
    pub fn remove(&mut self, entity: &T) -> DataResult<bool> {
        let key = self.inner.key_of(entity);
        if self.overlay.removed().contains(&key) {
            return Ok(false);
        }
        let pending =
            self.overlay.added().contains(&key) || self.overlay.updated().contains(&key);
        if !pending && !self.inner.contains(entity)? {
            return Ok(false);
        }
        let outcome: Removal = self.overlay.remove(key, entity.clone());
        self.inner.invalidate_index();
        tracing::trace!(?outcome, "entity removed through overlay");
        Ok(true)
    }

    /// Stage a modification.
    ///
    /// Pending additions are replaced (and repositioned); backend entities
    /// become pending updates. Entities pending removal, or unknown to the
    /// list, are rejected with `false`.
    pub fn update(&mut self, entity: T) -> DataResult<bool> {
        let key = self.inner.key_of(&entity);
        if self.overlay.removed().contains(&key) {
            return Ok(false);
        }
        if self.overlay.added().contains(&key) {
            if self.comparator.is_empty() {
                self.overlay.replace_added(&key, entity);
            } else {
                self.overlay.take_added(&key);
                let comparator = &self.comparator;
                self.overlay
                    .add_sorted(key, entity, |a, b| comparator.compare(a, b));
            }
            self.inner.invalidate_index();
            return Ok(true);
        }
        if self.overlay.updated().contains(&key) || self.inner.contains(&entity)? {
            self.overlay.mark_updated(key, entity);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn contains(&mut self, entity: &T) -> DataResult<bool> {
        let key = self.inner.key_of(entity);
        if self.overlay.added().contains(&key) || self.overlay.updated().contains(&key) {
            return Ok(true);
        }
        if self.overlay.removed().contains(&key) {
            return Ok(false);
        }
        self.inner.contains(entity)
    }

    pub fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>> {
        if self.overlay.is_empty() {
            return self.inner.index_of(entity);
        }
        let key = self.inner.key_of(entity);
        if self.overlay.removed().contains(&key) {
            return Ok(None);
        }
        if self.overlay.removed().is_empty() && self.comparator.is_empty() {
            if let Some(offset) = self.overlay.added().keys().position(|k| *k == key) {
                return Ok(Some(self.inner.size()? + offset));
            }
            return self.inner.index_of(entity);
        }
        let mut cursor = Cursor::new(self.inner.size()?);
        loop {
            let pos = cursor.pos;
            match self.next_merged(&mut cursor)? {
                Some((candidate, _)) if candidate == key => return Ok(Some(pos)),
                Some(_) => {}
                None => return Ok(None),
            }
        }
    }

    /// Entity at `index` in the merged order.
    ///
    /// A pending addition is placed before the first backend entity it sorts
    /// strictly before; on a comparator tie the backend entity comes first.
    /// Without sort keys pending additions therefore follow every backend
    /// entity. With pending removals, or with sort keys and pending
    /// additions still ahead of `index`, the merge is walked from the start,
    /// so the cost grows with `index`.
    pub fn get(&mut self, index: usize) -> DataResult<T> {
        let size = self.size()?;
        if index >= size {
            return Err(DataError::out_of_range(index, size));
        }
        if self.overlay.removed().is_empty() {
            if self.overlay.added().is_empty() {
                return self.backend_at(index);
            }
            if self.comparator.is_empty() {
                let backend_len = self.inner.size()?;
                return match index.checked_sub(backend_len) {
                    None => self.backend_at(index),
                    Some(offset) => self
                        .overlay
                        .added()
                        .at(offset)
                        .cloned()
                        .ok_or_else(|| DataError::out_of_range(index, size)),
                };
            }
        }
        self.merged_at(index)?
            .ok_or_else(|| DataError::out_of_range(index, size))
    }

    /// Backend entity at `index` with any pending update applied.
    fn backend_at(&mut self, index: usize) -> DataResult<T> {
        let entity = self.inner.get(index)?;
        let key = self.inner.key_of(&entity);
        Ok(self.overlay.updated().get(&key).cloned().unwrap_or(entity))
    }

    /// Walk the merge up to `index`.
    ///
    /// Once pending additions are exhausted and nothing is pending removal,
    /// the remaining positions map one to one onto backend indices.
    fn merged_at(&mut self, index: usize) -> DataResult<Option<T>> {
        let mut cursor = Cursor::new(self.inner.size()?);
        let direct_tail = self.overlay.removed().is_empty();
        loop {
            if direct_tail && cursor.added_index >= self.overlay.added().len() {
                if let Some((_, entity)) = cursor.peeked.take() {
                    if cursor.pos == index {
                        return Ok(Some(entity));
                    }
                    cursor.pos += 1;
                }
                let target = cursor.backend_index + (index - cursor.pos);
                if target >= cursor.backend_len {
                    return Ok(None);
                }
                return self.backend_at(target).map(Some);
            }
            let pos = cursor.pos;
            match self.next_merged(&mut cursor)? {
                Some((_, entity)) if pos == index => return Ok(Some(entity)),
                Some(_) => {}
                None => return Ok(None),
            }
        }
    }

    /// Next entity in merged order: a pending addition wins only when it
    /// sorts strictly before the next visible backend entity.
    fn next_merged(&mut self, cursor: &mut Cursor<G::Key, T>) -> DataResult<Option<(G::Key, T)>> {
        if cursor.peeked.is_none() {
            cursor.peeked = self.next_visible(&mut cursor.backend_index, cursor.backend_len)?;
        }
        let pending = self.overlay.added().entry_at(cursor.added_index);
        let take_added = match (cursor.peeked.as_ref(), pending) {
            (Some((_, backend)), Some((_, added))) => {
                self.comparator.compare(added, backend) == Ordering::Less
            }
            (None, Some(_)) => true,
            (_, None) => false,
        };
        let next = if take_added {
            cursor.added_index += 1;
            pending.map(|(key, entity)| (key.clone(), entity.clone()))
        } else {
            cursor.peeked.take()
        };
        if next.is_some() {
            cursor.pos += 1;
        }
        Ok(next)
    }

    /// Next backend entity not pending removal, with any pending update applied.
    fn next_visible(
        &mut self,
        backend_index: &mut usize,
        backend_len: usize,
    ) -> DataResult<Option<(G::Key, T)>> {
        while *backend_index < backend_len {
            let entity = self.inner.get(*backend_index)?;
            *backend_index += 1;
            let key = self.inner.key_of(&entity);
            if self.overlay.removed().contains(&key) {
                continue;
            }
            let entity = self.overlay.updated().get(&key).cloned().unwrap_or(entity);
            return Ok(Some((key, entity)));
        }
        Ok(None)
    }

    /// Apply new sort keys to the backend fetch and to pending additions.
    pub fn sort<S: AsRef<str>>(&mut self, property_names: &[S], orders: &[Order]) {
        self.sort_by_keys(SortKey::zip(property_names, orders));
    }

    pub fn sort_by_keys(&mut self, keys: Vec<SortKey>) {
        self.comparator = ReflectionComparator::for_type(keys.clone());
        let comparator = &self.comparator;
        self.overlay.resort_added(|a, b| comparator.compare(a, b));
        self.inner.sort_by_keys(keys);
    }

    /// Flush the overlay to the backend: removals, then updates, then additions.
    ///
    /// The page cache and row count are cleared afterwards, whether or not
    /// the flush completed, since part of it may already be applied. On
    /// failure the unapplied remainder stays pending and `commit` can be
    /// called again.
    pub fn commit(&mut self) -> DataResult<FlushStats> {
        if self.overlay.is_empty() {
            return Ok(FlushStats::default());
        }
        let provider = Arc::clone(self.inner.provider());
        let result = self.overlay.flush(provider.as_ref(), |_, _| {});
        self.inner.clear_cache();
        let stats = result?;
        tracing::debug!(
            removed = stats.removed,
            updated = stats.updated,
            added = stats.added,
            "overlay committed"
        );
        self.inner.notify(ListEvent::Committed);
        Ok(stats)
    }

    /// Drop pending changes without touching the backend.
    pub fn discard(&mut self) {
        self.overlay.clear();
        self.inner.invalidate_index();
    }

    /// Clear cached pages and the row count. Pending changes are kept.
    pub fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }

    pub fn add_listener(&mut self, listener: impl FnMut(ListEvent) + Send + 'static) -> ListenerId {
        self.inner.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.inner.remove_listener(id)
    }
}

impl<T, G> ListView<T> for EditableLazyList<T, G>
where
    T: Introspect + Clone,
    G: KeyGenerator<T>,
{
    fn size(&mut self) -> DataResult<usize> {
        EditableLazyList::size(self)
    }

    fn get(&mut self, index: usize) -> DataResult<T> {
        EditableLazyList::get(self, index)
    }

    fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>> {
        EditableLazyList::index_of(self, entity)
    }

    fn contains(&mut self, entity: &T) -> DataResult<bool> {
        EditableLazyList::contains(self, entity)
    }
}

/// Position in the merged walk.
struct Cursor<K, T> {
    backend_len: usize,
    backend_index: usize,
    added_index: usize,
    peeked: Option<(K, T)>,
    pos: usize,
}

impl<K, T> Cursor<K, T> {
    fn new(backend_len: usize) -> Self {
        Self {
            backend_len,
            backend_index: 0,
            added_index: 0,
            peeked: None,
            pos: 0,
        }
    }
}
