use crate::property::{Introspect, PropertyRegistry};
use folio_data::{Order, SortKey};
use std::cmp::Ordering;

/// Multi-key ordering over entities, driven by property names chosen at runtime.
///
/// Keys are evaluated in order and the first non-equal result wins. A key
/// whose property is unknown, unreadable on either side, or of mismatched
/// kinds is skipped. When every key ties (or is skipped) the entities compare
/// equal, so a stable sort keeps their relative order.
pub struct ReflectionComparator<'r, T> {
    registry: &'r PropertyRegistry<T>,
    keys: Vec<SortKey>,
}

impl<'r, T> ReflectionComparator<'r, T> {
    pub fn new(registry: &'r PropertyRegistry<T>, keys: Vec<SortKey>) -> Self {
        for key in &keys {
            if !registry.contains(&key.property) {
                tracing::debug!(property = %key.property, "unknown sort property, it will be ignored");
            }
        }
        Self { registry, keys }
    }

    /// Build from parallel slices of names and directions.
    pub fn from_parts<S: AsRef<str>>(
        registry: &'r PropertyRegistry<T>,
        property_names: &[S],
        orders: &[Order],
    ) -> Self {
        Self::new(registry, SortKey::zip(property_names, orders))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for key in &self.keys {
            let (Some(left), Some(right)) = (
                self.registry.read(a, &key.property),
                self.registry.read(b, &key.property),
            ) else {
                continue;
            };
            let result = match left.compare(&right) {
                Some(result) => result,
                None => continue,
            };
            if result != Ordering::Equal {
                return match key.order {
                    Order::Ascending => result,
                    Order::Descending => result.reverse(),
                };
            }
        }
        Ordering::Equal
    }
}

impl<T: Introspect> ReflectionComparator<'static, T> {
    /// Comparator over the type's own [`Introspect`] registry.
    pub fn for_type(keys: Vec<SortKey>) -> Self {
        Self::new(T::property_registry(), keys)
    }
}

impl<T> Clone for ReflectionComparator<'_, T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry,
            keys: self.keys.clone(),
        }
    }
}
