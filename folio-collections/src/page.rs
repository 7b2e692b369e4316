/// A contiguous slice of the backend-ordered collection, cached as a unit.
#[derive(Debug, Clone)]
pub struct Page<T> {
    number: usize,
    content: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(number: usize, content: Vec<T>) -> Self {
        Self { number, content }
    }

    /// Zero-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn get(&self, offset: usize) -> Option<&T> {
        self.content.get(offset)
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Global index of the first entity on this page.
    pub fn offset(&self, page_size: usize) -> usize {
        self.number * page_size
    }
}
