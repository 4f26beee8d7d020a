// Ordered collection management shared by skills, education and experience.
// Handlers call into `service` and `reorder`; everything else here is pure.

pub mod authz;
pub mod dates;
pub mod query;
pub mod reorder;
pub mod service;
pub mod validation;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use query::{SortField, SortKey};
use validation::Validate;

/// The `(owner_id, collection_key)` pair inside which `display_order` is a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub owner_id: Uuid,
    pub collection_key: Option<Uuid>,
}

impl Scope {
    pub fn new(owner_id: Uuid, collection_key: Option<Uuid>) -> Self {
        Scope {
            owner_id,
            collection_key,
        }
    }
}

/// Fields every orderable row carries.
pub trait Orderable {
    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
    fn collection_key(&self) -> Option<Uuid>;
    fn display_order(&self) -> i32;
    fn set_display_order(&mut self, order: i32);
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);
    fn touch(&mut self, now: DateTime<Utc>);

    fn scope(&self) -> Scope {
        Scope::new(self.owner_id(), self.collection_key())
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// A resource managed as an ordered collection.
///
/// Each implementor brings its own create/patch DTOs, list filter and sort
/// allow-list; the service, repositories and handlers are written once against
/// this trait.
pub trait Resource: Orderable + Clone + Serialize + Send + Sync + 'static {
    /// Singular noun used in log lines and error messages.
    const KIND: &'static str;

    type Create: Validate + DeserializeOwned + Send + Sync;
    type Patch: Validate + DeserializeOwned + Send + Sync;
    type Filter: DeserializeOwned + Send + Sync;
    type SortField: SortField;

    /// Owner requested in the create payload, if the caller named one.
    fn requested_owner(input: &Self::Create) -> Option<Uuid>;

    /// Explicit `display_order` in a create payload. `None` appends.
    fn requested_order(input: &Self::Create) -> Option<i32>;

    /// Explicit `display_order` in a patch payload.
    fn patched_order(patch: &Self::Patch) -> Option<i32>;

    /// Builds a new row. `display_order` is assigned by the repository.
    fn from_create(
        input: Self::Create,
        id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError>;

    /// Overlays a patch, enforcing resource rules on the merged record.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), AppError>;

    /// In-process evaluation of the list filter.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// In-process comparison on one sortable field, ascending.
    fn compare_by(&self, other: &Self, field: Self::SortField) -> Ordering;

    fn default_sort() -> Vec<SortKey<Self::SortField>>;
}

/// Ascending comparison where `None` sorts after every value, like PostgreSQL.
pub fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

/// Case-insensitive substring test used by in-process text filters.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
