//! Persistence seam for ordered collections.
//!
//! `AppState` holds one `Arc<dyn EntityRepository<E>>` per resource, backed by
//! either [`postgres::PgRepository`] or [`memory::InMemoryRepository`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ordering::query::{PageRequest, SortKey};
use crate::ordering::{Resource, Scope};

/// Where an edited row lands in its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Keep the row's current `display_order`, or the one the edit set.
    Keep,
    /// Append at `max(display_order) + 1` of the row's (new) scope.
    Append,
}

pub type RowEdit<'a, E> = Box<dyn FnOnce(&mut E) -> Result<Placement, AppError> + Send + 'a>;

#[async_trait]
pub trait EntityRepository<E: Resource>: Send + Sync {
    /// Inserts a new row. With no explicit order the row is appended at
    /// `max(display_order) + 1` in its scope, or `0` if the scope is empty.
    async fn insert(&self, entity: E, display_order: Option<i32>) -> Result<E, AppError>;

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<E>, AppError>;

    /// Non-deleted rows in a scope, `display_order` ascending.
    async fn find_by_scope(&self, scope: &Scope) -> Result<Vec<E>, AppError>;

    /// Locks the live row, lets `edit` change it, and writes the result in the
    /// same critical section. An error from `edit` leaves the row untouched.
    /// `None` if the row is missing or deleted.
    async fn update_with(&self, id: Uuid, edit: RowEdit<'_, E>) -> Result<Option<E>, AppError>;

    /// Atomically checks that `ordered_ids` is exactly the live membership of
    /// `scope`, then assigns `display_order = index`. Nothing is written on failure.
    async fn reorder_scope(&self, scope: &Scope, ordered_ids: &[Uuid]) -> Result<Vec<E>, AppError>;

    /// Marks a row deleted. `false` if it was missing or already deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Clears `deleted_at` and appends the row to its scope. `None` unless it was deleted.
    async fn restore(&self, id: Uuid) -> Result<Option<E>, AppError>;

    /// Filtered, sorted rows plus the total match count. `page: None` returns every match.
    async fn query(
        &self,
        filter: &E::Filter,
        sort: &[SortKey<E::SortField>],
        page: Option<&PageRequest>,
    ) -> Result<(Vec<E>, u64), AppError>;
}
