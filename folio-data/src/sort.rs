use serde::{Deserialize, Serialize};

/// Direction of a single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Order::Ascending
        } else {
            Order::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        matches!(self, Order::Ascending)
    }
}

/// A named property plus its direction, as passed to the backend fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub property: String,
    #[serde(default)]
    pub order: Order,
}

impl SortKey {
    pub fn new(property: impl Into<String>, order: Order) -> Self {
        Self {
            property: property.into(),
            order,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Order::Ascending)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Order::Descending)
    }

    /// Pair property names with directions.
    ///
    /// Extra entries on either side are ignored, so mismatched lengths yield
    /// as many keys as the shorter slice.
    pub fn zip<S: AsRef<str>>(property_names: &[S], orders: &[Order]) -> Vec<SortKey> {
        property_names
            .iter()
            .zip(orders)
            .map(|(name, order)| SortKey::new(name.as_ref(), *order))
            .collect()
    }
}
