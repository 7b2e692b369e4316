//! Eagerly loaded list with deferred, batched commit.

use crate::comparator::ReflectionComparator;
use crate::overlay::{FlushStats, Overlay};
use crate::property::{Introspect, PropertyRegistry};
use crate::view::ListView;
use folio_data::{DataError, DataProvider, DataResult, KeyGenerator, Order, SortKey};
use std::collections::HashMap;
use std::sync::Arc;

/// Fully materialized copy of a backend result with tracked changes.
///
/// The constructor fetches everything with a single `fetch(0, count)`.
/// Mutations apply to the in-memory view immediately and are recorded in
/// an [`Overlay`]; [`commit`](Self::commit) flushes them to the provider.
/// A key index (the codex) gives O(1) lookup by identity key.
pub struct ContainerList<T, G: KeyGenerator<T>> {
    provider: Arc<dyn DataProvider<T>>,
    keys: G,
    view: Vec<T>,
    changes: Overlay<G::Key, T>,
    codex: HashMap<G::Key, T>,
}

impl<T: Clone, G: KeyGenerator<T>> ContainerList<T, G> {
    pub fn new(provider: impl DataProvider<T> + 'static, keys: G) -> DataResult<Self> {
        Self::from_arc(Arc::new(provider), keys)
    }

    pub fn from_arc(provider: Arc<dyn DataProvider<T>>, keys: G) -> DataResult<Self> {
        let count = provider.count()?;
        let view = provider.fetch(0, count, &[])?;
        tracing::debug!(rows = view.len(), "container loaded");
        let codex = view
            .iter()
            .map(|e| (keys.generate(e), e.clone()))
            .collect();
        Ok(Self {
            provider,
            keys,
            view,
            changes: Overlay::default(),
            codex,
        })
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider<T>> {
        &self.provider
    }

    pub fn key_generator(&self) -> &G {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.view.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.view.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.view
    }

    pub fn get_by_key(&self, key: &G::Key) -> Option<&T> {
        self.codex.get(key)
    }

    pub fn contains_key(&self, key: &G::Key) -> bool {
        self.codex.contains_key(key)
    }

    /// Keys in view order.
    pub fn keys(&self) -> Vec<G::Key> {
        self.view.iter().map(|e| self.keys.generate(e)).collect()
    }

    pub fn key_at(&self, index: usize) -> Option<G::Key> {
        self.view.get(index).map(|e| self.keys.generate(e))
    }

    pub fn position(&self, key: &G::Key) -> Option<usize> {
        if !self.codex.contains_key(key) {
            return None;
        }
        self.view.iter().position(|e| self.keys.generate(e) == *key)
    }

    pub fn changes(&self) -> &Overlay<G::Key, T> {
        &self.changes
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Append an entity and record it as added.
    pub fn add(&mut self, entity: T) {
        self.view.push(entity.clone());
        self.track_added(entity);
    }

    /// Insert at `index` (`index <= len`) and record it as added.
    pub fn insert(&mut self, index: usize, entity: T) -> DataResult<()> {
        if index > self.view.len() {
            return Err(DataError::out_of_range(index, self.view.len()));
        }
        self.view.insert(index, entity.clone());
        self.track_added(entity);
        Ok(())
    }

    /// Ask the provider for a fresh entity and append it.
    pub fn add_item(&mut self) -> DataResult<T> {
        let item = self.provider.new_entity()?;
        self.add(item.clone());
        Ok(item)
    }

    /// Ask the provider for a fresh entity and insert it at `index`.
    pub fn add_item_at(&mut self, index: usize) -> DataResult<T> {
        if index > self.view.len() {
            return Err(DataError::out_of_range(index, self.view.len()));
        }
        let item = self.provider.new_entity()?;
        self.insert(index, item.clone())?;
        Ok(item)
    }

    /// Remove the entity with the same key. Returns `false` when absent.
    pub fn remove(&mut self, entity: &T) -> bool {
        match self.position(&self.keys.generate(entity)) {
            Some(index) => {
                let removed = self.view.remove(index);
                self.track_removed(removed);
                true
            }
            None => false,
        }
    }

    pub fn remove_at(&mut self, index: usize) -> DataResult<T> {
        if index >= self.view.len() {
            return Err(DataError::out_of_range(index, self.view.len()));
        }
        let removed = self.view.remove(index);
        self.track_removed(removed.clone());
        Ok(removed)
    }

    /// Replace the entity at `index`, returning the previous one.
    ///
    /// With the same key this is a modification; otherwise the previous
    /// entity is recorded as removed and the new one as added.
    pub fn set(&mut self, index: usize, entity: T) -> DataResult<T> {
        let len = self.view.len();
        let Some(slot) = self.view.get_mut(index) else {
            return Err(DataError::out_of_range(index, len));
        };
        let previous = std::mem::replace(slot, entity.clone());
        let (old_key, new_key) = (self.keys.generate(&previous), self.keys.generate(&entity));
        if old_key == new_key {
            self.track_updated(new_key, entity);
        } else {
            self.track_removed(previous.clone());
            self.track_added(entity);
        }
        Ok(previous)
    }

    /// Replace the entity with the same key. Returns `false` when absent.
    pub fn update(&mut self, entity: T) -> bool {
        let key = self.keys.generate(&entity);
        let Some(index) = self.position(&key) else {
            return false;
        };
        self.view[index] = entity.clone();
        self.track_updated(key, entity);
        true
    }

    /// Flush tracked changes: removals, then updates, then additions.
    ///
    /// Entities returned by `merge`/`persist` replace their in-memory copies.
    /// On failure the unapplied remainder stays pending; call `commit` again
    /// to retry. With nothing pending no backend call is made.
    pub fn commit(&mut self) -> DataResult<FlushStats> {
        if self.changes.is_empty() {
            return Ok(FlushStats::default());
        }
        let view = &mut self.view;
        let codex = &mut self.codex;
        let keys = &self.keys;
        let stats = self.changes.flush(self.provider.as_ref(), |key, saved| {
            if let Some(slot) = view.iter_mut().find(|e| keys.generate(e) == *key) {
                *slot = saved.clone();
                codex.insert(key.clone(), saved);
            }
        })?;
        tracing::debug!(
            removed = stats.removed,
            updated = stats.updated,
            added = stats.added,
            "container committed"
        );
        Ok(stats)
    }

    /// Stable in-place sort of the view using `registry` accessors.
    ///
    /// Only the in-memory order changes; nothing is sent to the backend.
    pub fn sort_with(&mut self, registry: &PropertyRegistry<T>, keys: Vec<SortKey>) {
        let comparator = ReflectionComparator::new(registry, keys);
        self.view.sort_by(|a, b| comparator.compare(a, b));
    }

    fn track_added(&mut self, entity: T) {
        let key = self.keys.generate(&entity);
        self.codex.insert(key.clone(), entity.clone());
        self.changes.add(key, entity);
    }

    fn track_removed(&mut self, entity: T) {
        let key = self.keys.generate(&entity);
        self.codex.remove(&key);
        self.changes.remove(key, entity);
    }

    fn track_updated(&mut self, key: G::Key, entity: T) {
        self.codex.insert(key.clone(), entity.clone());
        if !self.changes.replace_added(&key, entity.clone()) {
            self.changes.mark_updated(key, entity);
        }
    }
}

impl<T: Introspect + Clone, G: KeyGenerator<T>> ContainerList<T, G> {
    /// Sort by named properties of the entity type.
    pub fn sort<S: AsRef<str>>(&mut self, property_names: &[S], orders: &[Order]) {
        self.sort_with(T::property_registry(), SortKey::zip(property_names, orders));
    }
}

impl<T: Clone, G: KeyGenerator<T>> ListView<T> for ContainerList<T, G> {
    fn size(&mut self) -> DataResult<usize> {
        Ok(self.view.len())
    }

    fn get(&mut self, index: usize) -> DataResult<T> {
        self.view
            .get(index)
            .cloned()
            .ok_or_else(|| DataError::out_of_range(index, self.view.len()))
    }

    fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>> {
        Ok(self.position(&self.keys.generate(entity)))
    }

    fn contains(&mut self, entity: &T) -> DataResult<bool> {
        Ok(self.codex.contains_key(&self.keys.generate(entity)))
    }
}
