use folio_data::{
    DaoProvider, DataError, DataProvider, DataResult, GenericDao, KeyFn, KeyGenerator, Order,
    SortKey, Storable, StorableMeta,
};
use std::sync::Mutex;

#[derive(Clone, Debug)]
struct Item {
    meta: StorableMeta,
    label: &'static str,
}

impl Item {
    fn new(label: &'static str) -> Self {
        Self {
            meta: StorableMeta::new(),
            label,
        }
    }
}

impl Storable for Item {
    fn meta(&self) -> &StorableMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StorableMeta {
        &mut self.meta
    }
}

#[derive(Default)]
struct VecDao {
    rows: Mutex<Vec<Item>>,
}

impl VecDao {
    fn lock(&self) -> DataResult<std::sync::MutexGuard<'_, Vec<Item>>> {
        self.rows.lock().map_err(|e| DataError::Other(e.to_string()))
    }

    fn labels(&self) -> Vec<&'static str> {
        self.lock().unwrap().iter().map(|i| i.label).collect()
    }
}

impl GenericDao<Item> for VecDao {
    fn make_persistent(&self, entity: &Item) -> DataResult<Item> {
        let mut rows = self.lock()?;
        let mut stored = entity.clone();
        stored.meta_mut().id = Some(rows.len() as i64 + 1);
        rows.push(stored.clone());
        Ok(stored)
    }

    fn merge(&self, entity: &Item) -> DataResult<Item> {
        let mut rows = self.lock()?;
        let slot = rows
            .iter_mut()
            .find(|row| row.same_row(entity))
            .ok_or_else(|| DataError::NotFound(entity.comparation_id().to_string()))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    fn make_transient(&self, entity: &Item) -> DataResult<()> {
        self.lock()?.retain(|row| !row.same_row(entity));
        Ok(())
    }

    fn get(&self, id: i64) -> DataResult<Option<Item>> {
        Ok(self.lock()?.iter().find(|row| row.id() == Some(id)).cloned())
    }

    fn row_count(&self) -> DataResult<usize> {
        Ok(self.lock()?.len())
    }

    fn get_all(&self) -> DataResult<Vec<Item>> {
        Ok(self.lock()?.clone())
    }

    fn get_page(&self, offset: usize, count: usize, _sort: &[SortKey]) -> DataResult<Vec<Item>> {
        Ok(self.lock()?.iter().skip(offset).take(count).cloned().collect())
    }
}

#[test]
fn test_provider_maps_onto_dao() {
    let provider = DaoProvider::new(VecDao::default());
    let a = provider.persist(&Item::new("a")).unwrap();
    provider.persist(&Item::new("b")).unwrap();
    assert_eq!(a.id(), Some(1));
    assert_eq!(provider.count().unwrap(), 2);

    let mut renamed = a.clone();
    renamed.label = "a2";
    provider.merge(&renamed).unwrap();
    assert_eq!(provider.dao().labels(), vec!["a2", "b"]);

    let page = provider.fetch(1, 5, &[]).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].label, "b");

    provider.remove(&a).unwrap();
    assert_eq!(provider.dao().labels(), vec!["b"]);
}

#[test]
fn test_merge_of_unknown_row_is_not_found() {
    let provider = DaoProvider::new(VecDao::default());
    let err = provider.merge(&Item::new("ghost")).unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
}

#[test]
fn test_new_entity_needs_a_factory() {
    let provider = DaoProvider::new(VecDao::default());
    assert!(matches!(provider.new_entity(), Err(DataError::Unsupported(_))));

    let provider = provider.with_factory(|| Item::new("fresh"));
    let fresh = provider.new_entity().unwrap();
    assert_eq!(fresh.label, "fresh");
    assert_eq!(fresh.id(), None);
}

#[test]
fn test_dao_defaults() {
    let dao = VecDao::default();
    let saved = dao
        .make_persistent_all(&[Item::new("x"), Item::new("y")])
        .unwrap();
    assert_eq!(dao.get(2).unwrap().map(|i| i.label), Some("y"));
    assert_eq!(saved.len(), 2);
    dao.remove_all().unwrap();
    assert_eq!(dao.row_count().unwrap(), 0);
}

#[test]
fn test_key_fn_and_sort_keys() {
    let keys = KeyFn::new(|item: &Item| item.label);
    assert_eq!(keys.generate(&Item::new("k")), "k");

    let zipped = SortKey::zip(&["a", "b", "c"], &[Order::Descending, Order::Ascending]);
    assert_eq!(zipped, vec![SortKey::desc("a"), SortKey::asc("b")]);
    assert!(Order::from_ascending(true).is_ascending());
    assert_eq!(Order::default(), Order::Ascending);
}

#[test]
fn test_error_display() {
    let err = DataError::out_of_range(4, 2);
    assert!(err.to_string().contains('4'));
    let backend = DataError::backend(std::io::Error::other("disk full"));
    assert!(backend.is_backend());
    assert!(std::error::Error::source(&backend).is_some());
}
