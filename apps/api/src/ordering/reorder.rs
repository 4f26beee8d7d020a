use std::collections::HashSet;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::actor::Actor;
use crate::errors::{AppError, FieldError};
use crate::ordering::authz::ensure_can_mutate;
use crate::ordering::{Resource, Scope};
use crate::repository::EntityRepository;

/// Body of `POST /{resource}/reorder`.
///
/// The scope key is `category_id` for skills and `portfolio_id` for education
/// and experience; either spelling is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRequest {
    pub owner_id: Uuid,
    #[serde(default, alias = "category_id", alias = "portfolio_id")]
    pub collection_key: Option<Uuid>,
    pub ids_in_order: Vec<Uuid>,
}

impl ReorderRequest {
    pub fn scope(&self) -> Scope {
        Scope::new(self.owner_id, self.collection_key)
    }
}

/// Shape checks that need no database: non-empty, no duplicates.
pub fn check_request(ordered_ids: &[Uuid]) -> Result<(), AppError> {
    if ordered_ids.is_empty() {
        return Err(AppError::invalid_field("ids_in_order", "must not be empty"));
    }
    let mut seen = HashSet::with_capacity(ordered_ids.len());
    let duplicates: Vec<String> = ordered_ids
        .iter()
        .filter(|id| !seen.insert(**id))
        .map(Uuid::to_string)
        .collect();
    if !duplicates.is_empty() {
        return Err(AppError::Validation(vec![FieldError::new(
            "ids_in_order",
            format!("contains duplicate ids: {}", duplicates.join(", ")),
        )]));
    }
    Ok(())
}

/// Requires `ordered_ids` to be exactly the live membership of the scope.
pub fn check_reorder_set(current: &[Uuid], ordered_ids: &[Uuid]) -> Result<(), AppError> {
    let live: HashSet<Uuid> = current.iter().copied().collect();
    let requested: HashSet<Uuid> = ordered_ids.iter().copied().collect();
    if live == requested && requested.len() == ordered_ids.len() {
        return Ok(());
    }
    let missing = live.difference(&requested).count();
    let unknown = requested.difference(&live).count();
    Err(AppError::InvalidReorderSet(format!(
        "ids_in_order must list every item in the collection exactly once \
         ({missing} missing, {unknown} not in collection)"
    )))
}

/// `(id, display_order)` pairs for a validated order.
pub fn assignments(ordered_ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    ordered_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i as i32))
        .collect()
}

/// Renumbers a scope to `0..n-1` following `ordered_ids`.
///
/// All-or-nothing: the membership check and the writes happen inside one
/// repository transaction, so a rejected or failed call leaves every
/// `display_order` as it was.
pub async fn reorder<E: Resource>(
    repo: &dyn EntityRepository<E>,
    actor: &Actor,
    scope: Scope,
    ordered_ids: &[Uuid],
) -> Result<Vec<E>, AppError> {
    check_request(ordered_ids)?;
    ensure_can_mutate(actor, scope.owner_id, E::KIND)?;

    match repo.reorder_scope(&scope, ordered_ids).await {
        Ok(entities) => {
            info!(
                kind = E::KIND,
                owner_id = %scope.owner_id,
                collection_key = ?scope.collection_key,
                count = entities.len(),
                "Reordered collection"
            );
            Ok(entities)
        }
        Err(e @ AppError::InvalidReorderSet(_)) => {
            warn!(kind = E::KIND, owner_id = %scope.owner_id, "Rejected reorder: {e}");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_request_must_be_non_empty() {
        assert!(matches!(check_request(&[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_request_rejects_duplicates() {
        let a = Uuid::new_v4();
        assert!(matches!(
            check_request(&[a, Uuid::new_v4(), a]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_set_equal_in_any_order() {
        let live = ids(3);
        let reversed: Vec<Uuid> = live.iter().rev().copied().collect();
        assert!(check_reorder_set(&live, &reversed).is_ok());
    }

    #[test]
    fn test_missing_id_rejected() {
        let live = ids(3);
        let err = check_reorder_set(&live, &live[..2]).unwrap_err();
        match err {
            AppError::InvalidReorderSet(msg) => assert!(msg.contains("1 missing")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_foreign_id_rejected() {
        let live = ids(2);
        let mut requested = live.clone();
        requested.push(Uuid::new_v4());
        assert!(matches!(
            check_reorder_set(&live, &requested),
            Err(AppError::InvalidReorderSet(_))
        ));
    }

    #[test]
    fn test_swapped_foreign_id_rejected() {
        let live = ids(2);
        let requested = vec![live[0], Uuid::new_v4()];
        assert!(check_reorder_set(&live, &requested).is_err());
    }

    #[test]
    fn test_assignments_are_sequential() {
        let order = ids(3);
        let pairs = assignments(&order);
        assert_eq!(pairs, vec![(order[0], 0), (order[1], 1), (order[2], 2)]);
    }

    #[test]
    fn test_request_accepts_either_scope_spelling() {
        let owner = Uuid::new_v4();
        let key = Uuid::new_v4();
        let body = format!(r#"{{"owner_id":"{owner}","category_id":"{key}","ids_in_order":[]}}"#);
        let req: ReorderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.scope(), Scope::new(owner, Some(key)));

        let body = format!(r#"{{"owner_id":"{owner}","portfolio_id":"{key}","ids_in_order":[]}}"#);
        let req: ReorderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.collection_key, Some(key));

        let body = format!(r#"{{"owner_id":"{owner}","ids_in_order":[]}}"#);
        let req: ReorderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.collection_key, None);
    }
}
