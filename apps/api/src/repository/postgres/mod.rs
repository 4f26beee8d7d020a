//! PostgreSQL repository, generic over [`PgResource`].
//!
//! Tables follow `schema/portfolio.sql`. Every resource table has the same
//! bookkeeping columns (`id`, `owner_id`, a scope column, `display_order`,
//! timestamps, `deleted_at`); per-resource modules only describe their data
//! columns and filters.

mod education;
mod experience;
mod skills;

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgPool, Postgres, QueryBuilder, Type};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ordering::query::{PageRequest, SortField, SortKey};
use crate::ordering::reorder::{assignments, check_reorder_set};
use crate::ordering::{Orderable, Resource, Scope};
use crate::repository::{EntityRepository, Placement, RowEdit};

pub type Sql = QueryBuilder<'static, Postgres>;

/// Table layout of a resource stored in PostgreSQL.
pub trait PgResource: Resource + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;
    /// Column holding the collection key (`category_id`, `portfolio_id`).
    const SCOPE_COLUMN: &'static str;
    /// Resource data columns, in the order `push_values` binds them.
    const DATA_COLUMNS: &'static str;

    /// Comma-separated binds for `DATA_COLUMNS`.
    fn push_values(&self, qb: &mut Sql);

    /// Comma-separated `column = $n` assignments for every data column.
    fn push_assignments(&self, qb: &mut Sql);

    /// ` AND ...` predicates for the list filter.
    fn push_filters(filter: &Self::Filter, qb: &mut Sql);
}

pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        PgRepository {
            pool,
            _entity: PhantomData,
        }
    }
}

pub(crate) fn push_eq<T>(qb: &mut Sql, column: &str, value: Option<T>)
where
    T: Encode<'static, Postgres> + Type<Postgres> + Send + 'static,
{
    if let Some(value) = value {
        qb.push(format!(" AND {column} = ")).push_bind(value);
    }
}

pub(crate) fn push_ilike(qb: &mut Sql, column: &str, value: Option<&str>) {
    if let Some(value) = value {
        qb.push(format!(" AND {column} ILIKE ")).push_bind(like_pattern(value));
    }
}

pub(crate) fn push_date_bounds(
    qb: &mut Sql,
    column: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) {
    if let Some(from) = from {
        qb.push(format!(" AND {column} >= ")).push_bind(from);
    }
    if let Some(to) = to {
        qb.push(format!(" AND {column} <= ")).push_bind(to);
    }
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_scope<E: PgResource>(qb: &mut Sql, scope: &Scope) {
    qb.push(" AND owner_id = ")
        .push_bind(scope.owner_id)
        .push(format!(" AND {} IS NOT DISTINCT FROM ", E::SCOPE_COLUMN))
        .push_bind(scope.collection_key);
}

fn push_next_order<E: PgResource>(qb: &mut Sql, scope: &Scope) {
    qb.push(format!(
        "(SELECT COALESCE(MAX(display_order) + 1, 0) FROM {} WHERE deleted_at IS NULL",
        E::TABLE
    ));
    push_scope::<E>(qb, scope);
    qb.push(")");
}

fn scope_select_sql<E: PgResource>(suffix: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE owner_id = $1 AND {} IS NOT DISTINCT FROM $2 \
         AND deleted_at IS NULL {suffix}",
        E::TABLE,
        E::SCOPE_COLUMN
    )
}

#[async_trait]
impl<E: PgResource> EntityRepository<E> for PgRepository<E> {
    async fn insert(&self, entity: E, display_order: Option<i32>) -> Result<E, AppError> {
        let scope = entity.scope();
        let mut qb: Sql = QueryBuilder::new(format!(
            "INSERT INTO {} (id, owner_id, {}, {}, display_order) VALUES (",
            E::TABLE,
            E::SCOPE_COLUMN,
            E::DATA_COLUMNS
        ));
        qb.push_bind(entity.id())
            .push(", ")
            .push_bind(scope.owner_id)
            .push(", ")
            .push_bind(scope.collection_key)
            .push(", ");
        entity.push_values(&mut qb);
        qb.push(", ");
        match display_order {
            Some(order) => {
                qb.push_bind(order);
            }
            None => push_next_order::<E>(&mut qb, &scope),
        }
        qb.push(") RETURNING *");

        Ok(qb.build_query_as::<E>().fetch_one(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<E>, AppError> {
        let sql = if include_deleted {
            format!("SELECT * FROM {} WHERE id = $1", E::TABLE)
        } else {
            format!("SELECT * FROM {} WHERE id = $1 AND deleted_at IS NULL", E::TABLE)
        };
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_scope(&self, scope: &Scope) -> Result<Vec<E>, AppError> {
        Ok(
            sqlx::query_as::<_, E>(&scope_select_sql::<E>("ORDER BY display_order, id"))
                .bind(scope.owner_id)
                .bind(scope.collection_key)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_with(&self, id: Uuid, edit: RowEdit<'_, E>) -> Result<Option<E>, AppError> {
        let mut tx = self.pool.begin().await?;

        let select_sql = format!(
            "SELECT * FROM {} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            E::TABLE
        );
        let Some(mut entity) = sqlx::query_as::<_, E>(&select_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let placement = edit(&mut entity)?;
        let scope = entity.scope();
        if placement == Placement::Append {
            // Queue behind reorders and moves into the target scope.
            let lock_sql = format!(
                "SELECT id FROM {} WHERE owner_id = $1 AND {} IS NOT DISTINCT FROM $2 \
                 AND deleted_at IS NULL FOR UPDATE",
                E::TABLE,
                E::SCOPE_COLUMN
            );
            sqlx::query(&lock_sql)
                .bind(scope.owner_id)
                .bind(scope.collection_key)
                .execute(&mut *tx)
                .await?;
        }

        let mut qb: Sql = QueryBuilder::new(format!(
            "UPDATE {} SET {} = ",
            E::TABLE,
            E::SCOPE_COLUMN
        ));
        qb.push_bind(scope.collection_key).push(", display_order = ");
        match placement {
            Placement::Keep => {
                qb.push_bind(entity.display_order());
            }
            Placement::Append => push_next_order::<E>(&mut qb, &scope),
        }
        qb.push(", ");
        entity.push_assignments(&mut qb);
        qb.push(", updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *");

        let updated = qb.build_query_as::<E>().fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn reorder_scope(&self, scope: &Scope, ordered_ids: &[Uuid]) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the scope so a concurrent reorder waits and then re-validates.
        let lock_sql = format!(
            "SELECT id FROM {} WHERE owner_id = $1 AND {} IS NOT DISTINCT FROM $2 \
             AND deleted_at IS NULL FOR UPDATE",
            E::TABLE,
            E::SCOPE_COLUMN
        );
        let current = sqlx::query_scalar::<_, Uuid>(&lock_sql)
            .bind(scope.owner_id)
            .bind(scope.collection_key)
            .fetch_all(&mut *tx)
            .await?;

        // Dropping `tx` on any early return rolls back.
        check_reorder_set(&current, ordered_ids)?;

        let update_sql = format!(
            "UPDATE {} SET display_order = $1, updated_at = NOW() WHERE id = $2",
            E::TABLE
        );
        for (id, order) in assignments(ordered_ids) {
            sqlx::query(&update_sql)
                .bind(order)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let rows = sqlx::query_as::<_, E>(&scope_select_sql::<E>("ORDER BY display_order, id"))
            .bind(scope.owner_id)
            .bind(scope.collection_key)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(table = E::TABLE, rows = rows.len(), "Reorder committed");
        Ok(rows)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
            E::TABLE
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let sql = format!(
            "UPDATE {table} AS t SET deleted_at = NULL, updated_at = NOW(), \
                display_order = (SELECT COALESCE(MAX(s.display_order) + 1, 0) FROM {table} s \
                                 WHERE s.owner_id = t.owner_id \
                                   AND s.{scope} IS NOT DISTINCT FROM t.{scope} \
                                   AND s.deleted_at IS NULL) \
             WHERE t.id = $1 AND t.deleted_at IS NOT NULL \
             RETURNING *",
            table = E::TABLE,
            scope = E::SCOPE_COLUMN
        );
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn query(
        &self,
        filter: &E::Filter,
        sort: &[SortKey<E::SortField>],
        page: Option<&PageRequest>,
    ) -> Result<(Vec<E>, u64), AppError> {
        let mut count: Sql = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            E::TABLE
        ));
        E::push_filters(filter, &mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb: Sql = QueryBuilder::new(format!(
            "SELECT * FROM {} WHERE deleted_at IS NULL",
            E::TABLE
        ));
        E::push_filters(filter, &mut qb);
        qb.push(" ORDER BY ");
        for key in sort {
            qb.push(format!("{} {}, ", key.field.column(), key.direction.sql()));
        }
        qb.push("id ASC");
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit as i64)
                .push(" OFFSET ")
                .push_bind(page.offset() as i64);
        }

        let rows = qb.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok((rows, total.max(0) as u64))
    }
}
