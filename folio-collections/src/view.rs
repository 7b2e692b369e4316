use folio_data::DataResult;
use std::marker::PhantomData;

/// Index-addressable view shared by the lazy and eager lists.
///
/// Methods take `&mut self` because any read may fill a cache.
pub trait ListView<T> {
    fn size(&mut self) -> DataResult<usize>;

    fn get(&mut self, index: usize) -> DataResult<T>;

    fn index_of(&mut self, entity: &T) -> DataResult<Option<usize>>;

    fn contains(&mut self, entity: &T) -> DataResult<bool>;

    fn is_empty(&mut self) -> DataResult<bool> {
        Ok(self.size()? == 0)
    }

    /// Iterate in collection order. Calling again restarts from the first element.
    fn iter(&mut self) -> Iter<'_, T, Self>
    where
        Self: Sized,
    {
        Iter::new(self)
    }
}

/// Lazy iterator over a [`ListView`].
///
/// The size is read once when iteration starts. Backend errors are yielded
/// as items and end the iteration.
pub struct Iter<'a, T, L: ?Sized> {
    list: &'a mut L,
    index: usize,
    size: Option<usize>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, L: ListView<T> + ?Sized> Iter<'a, T, L> {
    pub fn new(list: &'a mut L) -> Self {
        Self {
            list,
            index: 0,
            size: None,
            done: false,
            _marker: PhantomData,
        }
    }
}

impl<T, L: ListView<T> + ?Sized> Iterator for Iter<'_, T, L> {
    type Item = DataResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let size = match self.size {
            Some(size) => size,
            None => match self.list.size() {
                Ok(size) => *self.size.insert(size),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            },
        };
        if self.index >= size {
            self.done = true;
            return None;
        }
        let item = self.list.get(self.index);
        self.index += 1;
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}
