//! In-memory views over large persisted collections.
//!
//! - [`LazyList`] pages entities in from a [`DataProvider`](folio_data::DataProvider)
//!   on demand and keeps a bounded [`PageCache`].
//! - [`EditableLazyList`] adds an uncommitted overlay of additions, updates and
//!   removals merged into the lazy order.
//! - [`ContainerList`] loads the whole result once and flushes tracked changes
//!   on [`commit`](ContainerList::commit).
//! - [`ReflectionComparator`] orders entities by property names chosen at runtime.

pub mod cache;
pub mod comparator;
pub mod config;
pub mod container;
pub mod editable;
pub mod lazy;
pub mod listener;
pub mod overlay;
pub mod page;
pub mod property;
pub mod view;

pub use cache::PageCache;
pub use comparator::ReflectionComparator;
pub use config::{ConfigError, ListConfig};
pub use container::ContainerList;
pub use editable::EditableLazyList;
pub use lazy::LazyList;
pub use listener::{ListEvent, ListenerId};
pub use overlay::{Addition, Bucket, FlushStats, Overlay, Removal};
pub use page::Page;
pub use property::{Introspect, PropertyRegistry, PropertyValue};
pub use view::{Iter, ListView};

pub mod prelude {
    //! Re-exports of the most commonly used collection types.
    pub use crate::{
        ContainerList, EditableLazyList, Introspect, LazyList, ListConfig, ListEvent, ListView,
        PropertyRegistry, PropertyValue, ReflectionComparator,
    };
}
