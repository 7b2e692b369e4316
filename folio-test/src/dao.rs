use folio_collections::{Introspect, ReflectionComparator};
use folio_data::{DataError, DataResult, GenericDao, SortKey, Storable};
use std::sync::{Arc, Mutex, MutexGuard};

/// DAO operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Fetch,
    Count,
    Persist,
    Merge,
    Remove,
}

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    pub fetch: usize,
    pub count: usize,
    pub persist: usize,
    pub merge: usize,
    pub remove: usize,
}

impl CallLog {
    /// Calls that write to the store.
    pub fn writes(&self) -> usize {
        self.persist + self.merge + self.remove
    }

    fn bump(&mut self, op: Op) {
        match op {
            Op::Fetch => self.fetch += 1,
            Op::Count => self.count += 1,
            Op::Persist => self.persist += 1,
            Op::Merge => self.merge += 1,
            Op::Remove => self.remove += 1,
        }
    }
}

/// Error raised by [`InMemoryDao`].
#[derive(Debug)]
pub struct MemoryError(pub String);

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "in-memory store: {}", self.0)
    }
}

impl std::error::Error for MemoryError {}

struct State<T> {
    rows: Vec<T>,
    next_id: i64,
    calls: CallLog,
    failures: Vec<Op>,
}

/// A [`GenericDao`] over a `Vec`, shared between clones.
///
/// Rows keep insertion order unless a fetch asks for sort keys, in which
/// case they are ordered with the entity's [`ReflectionComparator`]. Every
/// call is counted and any operation can be made to fail once with
/// [`fail_next`](Self::fail_next).
pub struct InMemoryDao<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for InMemoryDao<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Storable + Introspect> InMemoryDao<T> {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Seed the store. Rows without an id get one assigned.
    pub fn with_rows(rows: Vec<T>) -> Self {
        let mut next_id = 1;
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.id().is_none() {
                    row.meta_mut().id = Some(next_id);
                    next_id += 1;
                }
                row
            })
            .collect();
        Self {
            state: Arc::new(Mutex::new(State {
                rows,
                next_id,
                calls: CallLog::default(),
                failures: Vec::new(),
            })),
        }
    }

    pub fn calls(&self) -> CallLog {
        self.state.lock().map(|s| s.calls).unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls = CallLog::default();
        }
    }

    /// Current rows in storage order.
    pub fn rows(&self) -> Vec<T> {
        self.state.lock().map(|s| s.rows.clone()).unwrap_or_default()
    }

    /// Make the next call of `op` fail with a backend error.
    pub fn fail_next(&self, op: Op) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push(op);
        }
    }

    /// Insert directly into storage at `index`, bypassing the DAO surface.
    ///
    /// Simulates a concurrent writer.
    pub fn insert_raw(&self, index: usize, row: T) {
        if let Ok(mut state) = self.state.lock() {
            let index = index.min(state.rows.len());
            state.rows.insert(index, row);
        }
    }

    /// Remove directly from storage, bypassing the DAO surface.
    pub fn remove_raw(&self, index: usize) -> Option<T> {
        let mut state = self.state.lock().ok()?;
        (index < state.rows.len()).then(|| state.rows.remove(index))
    }

    fn enter(&self, op: Op) -> DataResult<MutexGuard<'_, State<T>>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| DataError::Other(e.to_string()))?;
        state.calls.bump(op);
        if let Some(pos) = state.failures.iter().position(|f| *f == op) {
            state.failures.remove(pos);
            return Err(DataError::backend(MemoryError(format!("injected {op:?} failure"))));
        }
        Ok(state)
    }
}

impl<T: Storable + Introspect> Default for InMemoryDao<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn position<T: Storable>(rows: &[T], entity: &T) -> Option<usize> {
    rows.iter().position(|row| row.same_row(entity))
}

impl<T: Storable + Introspect> GenericDao<T> for InMemoryDao<T> {
    fn make_persistent(&self, entity: &T) -> DataResult<T> {
        let mut state = self.enter(Op::Persist)?;
        if position(&state.rows, entity).is_some() {
            return Err(DataError::backend(MemoryError(format!(
                "duplicate comparation id {}",
                entity.comparation_id()
            ))));
        }
        let mut stored = entity.clone();
        if stored.id().is_none() {
            stored.meta_mut().id = Some(state.next_id);
            state.next_id += 1;
        }
        state.rows.push(stored.clone());
        Ok(stored)
    }

    fn merge(&self, entity: &T) -> DataResult<T> {
        let mut state = self.enter(Op::Merge)?;
        let index = position(&state.rows, entity)
            .ok_or_else(|| DataError::NotFound(entity.comparation_id().to_string()))?;
        let mut stored = entity.clone();
        stored.meta_mut().touch(None);
        state.rows[index] = stored.clone();
        Ok(stored)
    }

    fn make_transient(&self, entity: &T) -> DataResult<()> {
        let mut state = self.enter(Op::Remove)?;
        let index = position(&state.rows, entity)
            .ok_or_else(|| DataError::NotFound(entity.comparation_id().to_string()))?;
        state.rows.remove(index);
        Ok(())
    }

    fn get(&self, id: i64) -> DataResult<Option<T>> {
        let state = self.enter(Op::Fetch)?;
        Ok(state.rows.iter().find(|row| row.id() == Some(id)).cloned())
    }

    fn row_count(&self) -> DataResult<usize> {
        Ok(self.enter(Op::Count)?.rows.len())
    }

    fn get_all(&self) -> DataResult<Vec<T>> {
        Ok(self.enter(Op::Fetch)?.rows.clone())
    }

    fn get_page(&self, offset: usize, count: usize, sort: &[SortKey]) -> DataResult<Vec<T>> {
        let state = self.enter(Op::Fetch)?;
        if sort.is_empty() {
            return Ok(state.rows.iter().skip(offset).take(count).cloned().collect());
        }
        let comparator = ReflectionComparator::<T>::for_type(sort.to_vec());
        let mut ordered: Vec<&T> = state.rows.iter().collect();
        ordered.sort_by(|a, b| comparator.compare(a, b));
        Ok(ordered.into_iter().skip(offset).take(count).cloned().collect())
    }
}
