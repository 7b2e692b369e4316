use crate::entity::Storable;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Derives the identity key of an entity.
///
/// Keys must be stable for the logical lifetime of the entity and unique
/// within a collection. Collections use them for overlay bookkeeping, drift
/// detection and reverse lookups; two entities with equal keys are treated as
/// the same row.
pub trait KeyGenerator<T>: Send + Sync {
    type Key: Eq + Hash + Clone + Debug + Send + Sync;

    fn generate(&self, entity: &T) -> Self::Key;
}

/// Keys [`Storable`] entities by their comparation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorableKeyGenerator;

impl<T: Storable> KeyGenerator<T> for StorableKeyGenerator {
    type Key = String;

    fn generate(&self, entity: &T) -> String {
        entity.comparation_id().to_string()
    }
}

/// Adapts a closure into a [`KeyGenerator`].
///
/// ```ignore
/// let keys = KeyFn::new(|row: &Row| row.sku.clone());
/// ```
pub struct KeyFn<F, K> {
    f: F,
    _marker: PhantomData<fn() -> K>,
}

impl<F, K> KeyFn<F, K> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, K> Clone for KeyFn<F, K> {
    fn clone(&self) -> Self {
        Self::new(self.f.clone())
    }
}

impl<T, F, K> KeyGenerator<T> for KeyFn<F, K>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Eq + Hash + Clone + Debug + Send + Sync,
{
    type Key = K;

    fn generate(&self, entity: &T) -> K {
        (self.f)(entity)
    }
}
