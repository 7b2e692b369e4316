use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookkeeping columns shared by every persisted entity.
///
/// The `comparation_id` is a random UUID assigned when the object is created
/// and is never changed by the backend. It identifies the same logical row
/// both before and after the database assigns an `id`, which makes it the
/// natural identity key for in-memory collections.
///
/// Timestamps are truncated to whole seconds so that values read back from
/// stores with second precision compare equal to the in-memory ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorableMeta {
    pub id: Option<i64>,
    comparation_id: String,
    creation_time: DateTime<Utc>,
    created_by: Option<i64>,
    update_time: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
}

impl StorableMeta {
    pub fn new() -> Self {
        Self {
            id: None,
            comparation_id: new_comparation_id(),
            creation_time: now(),
            created_by: None,
            update_time: None,
            updated_by: None,
        }
    }

    /// Create metadata with a caller-provided comparation id.
    ///
    /// Only meant for rehydrating rows that already carry an identity.
    pub fn with_comparation_id(comparation_id: impl Into<String>) -> Self {
        Self {
            comparation_id: comparation_id.into(),
            ..Self::new()
        }
    }

    pub fn comparation_id(&self) -> &str {
        &self.comparation_id
    }

    /// The comparation id without dashes, usable as an identifier in rule engines.
    pub fn unique_name_readable(&self) -> String {
        self.comparation_id.replace('-', "")
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn set_creation_time(&mut self, time: DateTime<Utc>) {
        self.creation_time = time.trunc_subsecs(0);
    }

    pub fn created_by(&self) -> Option<i64> {
        self.created_by
    }

    pub fn set_created_by(&mut self, user: Option<i64>) {
        self.created_by = user;
    }

    /// Last update time, falling back to the creation time for rows never updated.
    pub fn update_time(&self) -> DateTime<Utc> {
        self.update_time.unwrap_or(self.creation_time)
    }

    pub fn set_update_time(&mut self, time: DateTime<Utc>) {
        self.update_time = Some(time.trunc_subsecs(0));
    }

    pub fn updated_by(&self) -> Option<i64> {
        self.updated_by
    }

    pub fn set_updated_by(&mut self, user: Option<i64>) {
        self.updated_by = user;
    }

    /// Record a modification by `user` at the current time.
    pub fn touch(&mut self, user: Option<i64>) {
        self.set_update_time(Utc::now());
        if user.is_some() {
            self.updated_by = user;
        }
    }

    /// Forget the database id and draw a fresh comparation id.
    ///
    /// The entity then represents a new logical row.
    pub fn reset_ids(&mut self) {
        self.id = None;
        self.comparation_id = new_comparation_id();
    }

    /// Copy id, identity and audit columns from another entity.
    ///
    /// The creation time is left untouched.
    pub fn copy_basic_info(&mut self, other: &StorableMeta) {
        self.id = other.id;
        self.comparation_id = other.comparation_id.clone();
        self.created_by = other.created_by;
        self.updated_by = other.updated_by;
        self.update_time = other.update_time;
    }

    /// Stamp both audit users and reset both timestamps to now.
    pub fn reset_user_timestamp_info(&mut self, user: Option<i64>) {
        self.created_by = user;
        self.updated_by = user;
        self.creation_time = now();
        self.update_time = Some(self.creation_time);
    }
}

impl Default for StorableMeta {
    fn default() -> Self {
        Self::new()
    }
}

fn new_comparation_id() -> String {
    Uuid::new_v4().to_string()
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Trait representing a persisted entity carrying [`StorableMeta`].
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct Invoice {
///     meta: StorableMeta,
///     number: String,
/// }
///
/// impl Storable for Invoice {
///     fn meta(&self) -> &StorableMeta { &self.meta }
///     fn meta_mut(&mut self) -> &mut StorableMeta { &mut self.meta }
/// }
/// ```
pub trait Storable: Clone + Send + Sync + 'static {
    fn meta(&self) -> &StorableMeta;
    fn meta_mut(&mut self) -> &mut StorableMeta;

    fn id(&self) -> Option<i64> {
        self.meta().id
    }

    fn comparation_id(&self) -> &str {
        self.meta().comparation_id()
    }

    /// Two storable values are the same logical row iff their comparation ids match.
    fn same_row(&self, other: &Self) -> bool {
        self.comparation_id() == other.comparation_id()
    }
}
