//! Process-local repository.
//!
//! Every mutation runs under one write lock, which gives reorders the same
//! all-or-nothing behaviour a PostgreSQL transaction does.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ordering::query::{PageRequest, SortDirection, SortKey};
use crate::ordering::reorder::{assignments, check_reorder_set};
use crate::ordering::{Orderable, Resource, Scope};
use crate::repository::{EntityRepository, Placement, RowEdit};

pub struct InMemoryRepository<E> {
    rows: RwLock<HashMap<Uuid, E>>,
}

impl<E> InMemoryRepository<E> {
    pub fn new() -> Self {
        InMemoryRepository {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn live_in_scope<'a, E: Resource>(
    rows: &'a HashMap<Uuid, E>,
    scope: &'a Scope,
) -> impl Iterator<Item = &'a E> + 'a {
    rows.values()
        .filter(move |e| !e.is_deleted() && e.scope() == *scope)
}

fn next_order<E: Resource>(rows: &HashMap<Uuid, E>, scope: &Scope) -> i32 {
    live_in_scope(rows, scope)
        .map(|e| e.display_order())
        .max()
        .map_or(0, |max| max + 1)
}

fn sorted_scope<E: Resource>(rows: &HashMap<Uuid, E>, scope: &Scope) -> Vec<E> {
    let mut out: Vec<E> = live_in_scope(rows, scope).cloned().collect();
    out.sort_by(|a, b| {
        a.display_order()
            .cmp(&b.display_order())
            .then_with(|| a.id().cmp(&b.id()))
    });
    out
}

fn compare<E: Resource>(a: &E, b: &E, sort: &[SortKey<E::SortField>]) -> Ordering {
    for key in sort {
        let ord = a.compare_by(b, key.field);
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id().cmp(&b.id())
}

#[async_trait]
impl<E: Resource> EntityRepository<E> for InMemoryRepository<E> {
    async fn insert(&self, mut entity: E, display_order: Option<i32>) -> Result<E, AppError> {
        let mut rows = self.rows.write().await;
        let order = match display_order {
            Some(order) => order,
            None => next_order(&rows, &entity.scope()),
        };
        entity.set_display_order(order);
        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<E>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned())
    }

    async fn find_by_scope(&self, scope: &Scope) -> Result<Vec<E>, AppError> {
        let rows = self.rows.read().await;
        Ok(sorted_scope(&rows, scope))
    }

    async fn update_with(&self, id: Uuid, edit: RowEdit<'_, E>) -> Result<Option<E>, AppError> {
        let mut rows = self.rows.write().await;
        let Some(mut entity) = rows.get(&id).filter(|e| !e.is_deleted()).cloned() else {
            return Ok(None);
        };
        if edit(&mut entity)? == Placement::Append {
            let order = next_order(&rows, &entity.scope());
            entity.set_display_order(order);
        }
        entity.touch(Utc::now());
        rows.insert(id, entity.clone());
        Ok(Some(entity))
    }

    async fn reorder_scope(&self, scope: &Scope, ordered_ids: &[Uuid]) -> Result<Vec<E>, AppError> {
        let mut rows = self.rows.write().await;
        let current: Vec<Uuid> = live_in_scope(&rows, scope).map(|e| e.id()).collect();
        check_reorder_set(&current, ordered_ids)?;

        let now = Utc::now();
        for (id, order) in assignments(ordered_ids) {
            if let Some(row) = rows.get_mut(&id) {
                row.set_display_order(order);
                row.touch(now);
            }
        }
        Ok(sorted_scope(&rows, scope))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(row) if !row.is_deleted() => {
                let now = Utc::now();
                row.set_deleted_at(Some(now));
                row.touch(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let mut rows = self.rows.write().await;
        let scope = match rows.get(&id) {
            Some(row) if row.is_deleted() => row.scope(),
            _ => return Ok(None),
        };
        let order = next_order(&rows, &scope);
        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        row.set_deleted_at(None);
        row.set_display_order(order);
        row.touch(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn query(
        &self,
        filter: &E::Filter,
        sort: &[SortKey<E::SortField>],
        page: Option<&PageRequest>,
    ) -> Result<(Vec<E>, u64), AppError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<&E> = rows
            .values()
            .filter(|e| !e.is_deleted() && e.matches(filter))
            .collect();
        matched.sort_by(|a, b| compare(*a, *b, sort));

        let total = matched.len() as u64;
        let data = match page {
            None => matched.into_iter().cloned().collect(),
            Some(req) => matched
                .into_iter()
                .skip(req.offset().min(usize::MAX as u64) as usize)
                .take(req.limit as usize)
                .cloned()
                .collect(),
        };
        Ok((data, total))
    }
}
