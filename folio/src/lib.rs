//! Folio: in-memory views over persisted entity collections.
//!
//! This facade crate re-exports the Folio sub-crates through a single
//! dependency. Import everything you need with:
//!
//! ```ignore
//! use folio::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature       | Default | Crate               |
//! |---------------|---------|---------------------|
//! | `collections` | **yes** | `folio-collections` |

pub use folio_data;

#[cfg(feature = "collections")]
pub use folio_collections;

pub use folio_data::{DataError, DataProvider, DataResult, GenericDao, KeyGenerator, SortKey};

/// Unified prelude: `use folio::prelude::*`.
pub mod prelude {
    pub use folio_data::prelude::*;

    #[cfg(feature = "collections")]
    pub use folio_collections::prelude::*;
}
