pub mod dao;
pub mod entity;
pub mod error;
pub mod key;
pub mod provider;
pub mod sort;

pub use dao::{DaoProvider, GenericDao};
pub use entity::{Storable, StorableMeta};
pub use error::{DataError, DataResult};
pub use key::{KeyFn, KeyGenerator, StorableKeyGenerator};
pub use provider::DataProvider;
pub use sort::{Order, SortKey};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        DaoProvider, DataError, DataProvider, GenericDao, KeyGenerator, Order, SortKey, Storable,
        StorableKeyGenerator, StorableMeta,
    };
}
