//! Named property access for runtime-chosen sort keys.
//!
//! Rust has no runtime reflection, so each entity type registers its sortable
//! fields once in a [`PropertyRegistry`]: a map from field name to a typed
//! accessor. Comparators look accessors up by name at compare time and
//! ignore names the registry does not know.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A property value read from an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(&'a str),
    Timestamp(DateTime<Utc>),
}

impl PropertyValue<'_> {
    /// Compare two values of the same kind.
    ///
    /// Text compares case-insensitively, everything else by natural order.
    /// Mismatched kinds and NaN floats are not comparable and yield `None`.
    pub fn compare(&self, other: &PropertyValue<'_>) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => Some(a.cmp(b)),
            (PropertyValue::Int(a), PropertyValue::Int(b)) => Some(a.cmp(b)),
            (PropertyValue::UInt(a), PropertyValue::UInt(b)) => Some(a.cmp(b)),
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.partial_cmp(b),
            (PropertyValue::Text(a), PropertyValue::Text(b)) => Some(compare_ignore_case(a, b)),
            (PropertyValue::Timestamp(a), PropertyValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl<'a> From<&'a str> for PropertyValue<'a> {
    fn from(value: &'a str) -> Self {
        PropertyValue::Text(value)
    }
}

impl<'a> From<&'a String> for PropertyValue<'a> {
    fn from(value: &'a String) -> Self {
        PropertyValue::Text(value.as_str())
    }
}

impl From<bool> for PropertyValue<'_> {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i32> for PropertyValue<'_> {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value.into())
    }
}

impl From<i64> for PropertyValue<'_> {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue<'_> {
    fn from(value: u32) -> Self {
        PropertyValue::UInt(value.into())
    }
}

impl From<u64> for PropertyValue<'_> {
    fn from(value: u64) -> Self {
        PropertyValue::UInt(value)
    }
}

impl From<f64> for PropertyValue<'_> {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(value)
    }
}

type Accessor<T> = Box<dyn for<'a> Fn(&'a T) -> Option<PropertyValue<'a>> + Send + Sync>;

/// Name → accessor map for one entity type.
///
/// An accessor returning `None` marks the property as unreadable for that
/// entity (for example an unset optional field).
///
/// ```ignore
/// let registry = PropertyRegistry::new()
///     .property("name", |p: &Person| Some(PropertyValue::from(&p.name)))
///     .property("age", |p: &Person| Some(p.age.into()))
///     .property("email", |p: &Person| p.email.as_deref().map(PropertyValue::from));
/// ```
pub struct PropertyRegistry<T> {
    accessors: HashMap<String, Accessor<T>>,
}

impl<T> PropertyRegistry<T> {
    pub fn new() -> Self {
        Self {
            accessors: HashMap::new(),
        }
    }

    /// Register an accessor under `name`, replacing any previous one.
    pub fn property<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> Option<PropertyValue<'a>> + Send + Sync + 'static,
    {
        self.accessors.insert(name.into(), Box::new(accessor));
        self
    }

    /// Read a property. Unknown names and unreadable values both yield `None`.
    pub fn read<'a>(&self, entity: &'a T, name: &str) -> Option<PropertyValue<'a>> {
        self.accessors.get(name).and_then(|accessor| accessor(entity))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }
}

impl<T> Default for PropertyRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity types that expose a [`PropertyRegistry`].
///
/// The registry is built once per type, typically behind a `OnceLock`:
///
/// ```ignore
/// impl Introspect for Person {
///     fn property_registry() -> &'static PropertyRegistry<Self> {
///         static REGISTRY: OnceLock<PropertyRegistry<Person>> = OnceLock::new();
///         REGISTRY.get_or_init(|| {
///             PropertyRegistry::new().property("name", |p: &Person| Some((&p.name).into()))
///         })
///     }
/// }
/// ```
pub trait Introspect: Sized + 'static {
    fn property_registry() -> &'static PropertyRegistry<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        label: String,
        weight: Option<f64>,
    }

    fn registry() -> PropertyRegistry<Row> {
        PropertyRegistry::new()
            .property("label", |r: &Row| Some(PropertyValue::from(&r.label)))
            .property("weight", |r: &Row| r.weight.map(PropertyValue::from))
    }

    #[test]
    fn test_text_ignores_case() {
        let a = PropertyValue::Text("apple");
        let b = PropertyValue::Text("APPLE");
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
        assert_eq!(PropertyValue::Text("a").compare(&PropertyValue::Text("B")), Some(Ordering::Less));
    }

    #[test]
    fn test_mismatched_kinds_not_comparable() {
        assert_eq!(PropertyValue::Int(1).compare(&PropertyValue::Text("1")), None);
        assert_eq!(PropertyValue::Float(f64::NAN).compare(&PropertyValue::Float(1.0)), None);
    }

    #[test]
    fn test_read_unknown_and_unreadable() {
        let registry = registry();
        let row = Row {
            label: "x".into(),
            weight: None,
        };
        assert_eq!(registry.read(&row, "label"), Some(PropertyValue::Text("x")));
        assert_eq!(registry.read(&row, "weight"), None);
        assert_eq!(registry.read(&row, "missing"), None);
        assert!(registry.contains("weight"));
        assert!(!registry.contains("missing"));
    }
}
