/// Errors that can occur in the data layer and in the collections built on it.
#[derive(Debug)]
pub enum DataError {
    /// An index outside `[0, size)` was requested.
    OutOfRange { index: usize, size: usize },
    /// The operation is not supported by this provider or collection.
    Unsupported(String),
    NotFound(String),
    /// Any failure surfaced by the backend (fetch, count, persist, merge, remove).
    Backend(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Backend` variant from any error type.
    ///
    /// Used by provider implementations to wrap driver-specific errors.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Backend(Box::new(err))
    }

    pub fn out_of_range(index: usize, size: usize) -> Self {
        DataError::OutOfRange { index, size }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        DataError::Unsupported(operation.into())
    }

    /// Returns `true` for failures that originated in the backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, DataError::Backend(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::OutOfRange { index, size } => {
                write!(f, "Index out of range: {index} (size {size})")
            }
            DataError::Unsupported(op) => write!(f, "Unsupported operation: {op}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Backend(err) => write!(f, "Backend error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, DataError>;
