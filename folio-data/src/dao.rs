use crate::entity::Storable;
use crate::error::{DataError, DataResult};
use crate::provider::DataProvider;
use crate::sort::SortKey;
use std::marker::PhantomData;

/// Generic synchronous DAO for [`Storable`] entities.
///
/// Session and transaction handling belong to the implementation; this trait
/// only describes the CRUD surface the rest of the crate relies on.
pub trait GenericDao<T: Storable>: Send + Sync {
    /// Insert a new row. The returned value carries the assigned id.
    fn make_persistent(&self, entity: &T) -> DataResult<T>;

    /// Update an existing row, returning the managed version.
    fn merge(&self, entity: &T) -> DataResult<T>;

    /// Delete the row backing `entity`. The in-memory value is left as is.
    fn make_transient(&self, entity: &T) -> DataResult<()>;

    fn get(&self, id: i64) -> DataResult<Option<T>>;

    fn row_count(&self) -> DataResult<usize>;

    fn get_all(&self) -> DataResult<Vec<T>>;

    fn get_page(&self, offset: usize, count: usize, sort: &[SortKey]) -> DataResult<Vec<T>>;

    fn make_persistent_all(&self, entities: &[T]) -> DataResult<Vec<T>> {
        entities.iter().map(|e| self.make_persistent(e)).collect()
    }

    fn remove_all(&self) -> DataResult<()> {
        for entity in self.get_all()? {
            self.make_transient(&entity)?;
        }
        Ok(())
    }

    /// Drop any second-level cache the implementation keeps.
    fn evict_cache(&self) {}
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Exposes a [`GenericDao`] as a [`DataProvider`].
///
/// `persist` maps to `make_persistent`, `merge` to `merge` and `remove` to
/// `make_transient`. `new_entity` is only available when a factory was
/// supplied with [`with_factory`](Self::with_factory).
pub struct DaoProvider<T, D> {
    dao: D,
    factory: Option<Factory<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Storable, D: GenericDao<T>> DaoProvider<T, D> {
    pub fn new(dao: D) -> Self {
        Self {
            dao,
            factory: None,
            _marker: PhantomData,
        }
    }

    pub fn with_factory(mut self, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn dao(&self) -> &D {
        &self.dao
    }
}

impl<T: Storable, D: GenericDao<T>> DataProvider<T> for DaoProvider<T, D> {
    fn fetch(&self, offset: usize, count: usize, sort: &[SortKey]) -> DataResult<Vec<T>> {
        self.dao.get_page(offset, count, sort)
    }

    fn count(&self) -> DataResult<usize> {
        self.dao.row_count()
    }

    fn persist(&self, entity: &T) -> DataResult<T> {
        tracing::trace!(comparation_id = entity.comparation_id(), "persist");
        self.dao.make_persistent(entity)
    }

    fn merge(&self, entity: &T) -> DataResult<T> {
        tracing::trace!(comparation_id = entity.comparation_id(), "merge");
        self.dao.merge(entity)
    }

    fn remove(&self, entity: &T) -> DataResult<()> {
        tracing::trace!(comparation_id = entity.comparation_id(), "remove");
        self.dao.make_transient(entity)
    }

    fn new_entity(&self) -> DataResult<T> {
        match &self.factory {
            Some(factory) => Ok(factory()),
            None => Err(DataError::unsupported("new_entity")),
        }
    }
}
