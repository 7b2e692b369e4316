use crate::error::{DataError, DataResult};
use crate::sort::SortKey;

/// Backend access port used by the collections.
///
/// Every call is synchronous and may block for the duration of the
/// underlying I/O. Errors are returned unchanged to the collection caller;
/// nothing is retried on this side.
pub trait DataProvider<T>: Send + Sync {
    /// Fetch up to `count` entities starting at `offset`, ordered by `sort`.
    ///
    /// An empty `sort` means the backend's natural order.
    fn fetch(&self, offset: usize, count: usize, sort: &[SortKey]) -> DataResult<Vec<T>>;

    /// Total number of entities visible through [`fetch`](Self::fetch).
    fn count(&self) -> DataResult<usize>;

    /// Store a new entity, returning the persisted version.
    fn persist(&self, entity: &T) -> DataResult<T>;

    /// Store changes to an existing entity, returning the managed version.
    fn merge(&self, entity: &T) -> DataResult<T>;

    fn remove(&self, entity: &T) -> DataResult<()>;

    /// Create a fresh, empty entity. Providers without a factory keep the default.
    fn new_entity(&self) -> DataResult<T> {
        Err(DataError::unsupported("new_entity"))
    }
}
