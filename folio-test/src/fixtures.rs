use folio_collections::{Introspect, PropertyRegistry, PropertyValue};
use folio_data::{Storable, StorableMeta};
use std::sync::OnceLock;

/// Sample entity used across the test suites.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub meta: StorableMeta,
    pub name: String,
    pub age: i64,
    pub email: Option<String>,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            meta: StorableMeta::new(),
            name: name.into(),
            age,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl Storable for Person {
    fn meta(&self) -> &StorableMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StorableMeta {
        &mut self.meta
    }
}

impl Introspect for Person {
    fn property_registry() -> &'static PropertyRegistry<Self> {
        static REGISTRY: OnceLock<PropertyRegistry<Person>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            PropertyRegistry::new()
                .property("name", |p: &Person| Some(PropertyValue::from(&p.name)))
                .property("age", |p: &Person| Some(PropertyValue::from(p.age)))
                .property("email", |p: &Person| p.email.as_deref().map(PropertyValue::from))
                .property("id", |p: &Person| p.meta.id.map(PropertyValue::from))
                .property("creationTime", |p: &Person| {
                    Some(PropertyValue::from(p.meta.creation_time()))
                })
        })
    }
}

/// One person per name, aged 20, 21, 22, ...
pub fn people(names: &[&str]) -> Vec<Person> {
    names
        .iter()
        .zip(20..)
        .map(|(name, age)| Person::new(*name, age))
        .collect()
}
