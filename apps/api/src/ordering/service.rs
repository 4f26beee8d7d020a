//! Generic CRUD over an ordered collection.
//!
//! Every function takes the acting user explicitly; handlers never consult
//! ambient request state past extraction.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::actor::Actor;
use crate::config::Config;
use crate::errors::AppError;
use crate::ordering::authz::ensure_can_mutate;
use crate::ordering::query::{resolve_sort, ListParams, Page, PageRequest};
use crate::ordering::validation::Validate;
use crate::ordering::{Orderable, Resource};
use crate::repository::{EntityRepository, Placement, RowEdit};

fn not_found<E: Resource>(id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {id} not found", E::KIND))
}

pub async fn create<E: Resource>(
    repo: &dyn EntityRepository<E>,
    actor: &Actor,
    input: E::Create,
) -> Result<E, AppError> {
    input.check()?;
    let owner_id = E::requested_owner(&input).unwrap_or(actor.id);
    ensure_can_mutate(actor, owner_id, E::KIND)?;

    let display_order = E::requested_order(&input);
    let entity = E::from_create(input, Uuid::new_v4(), owner_id, Utc::now())?;
    let created = repo.insert(entity, display_order).await?;

    info!(
        kind = E::KIND,
        id = %created.id(),
        %owner_id,
        display_order = created.display_order(),
        "Created entry"
    );
    Ok(created)
}

pub async fn get<E: Resource>(repo: &dyn EntityRepository<E>, id: Uuid) -> Result<E, AppError> {
    repo.find_by_id(id, false)
        .await?
        .ok_or_else(|| not_found::<E>(id))
}

pub async fn update<E: Resource>(
    repo: &dyn EntityRepository<E>,
    actor: &Actor,
    id: Uuid,
    patch: E::Patch,
) -> Result<E, AppError> {
    patch.check()?;
    let order_pinned = E::patched_order(&patch).is_some();

    // Applied to the row as the backend holds it under lock.
    let edit: RowEdit<'_, E> = Box::new(move |entity: &mut E| -> Result<Placement, AppError> {
        ensure_can_mutate(actor, entity.owner_id(), E::KIND)?;
        let previous_scope = entity.scope();
        entity.apply_patch(patch)?;
        // Moving to another collection appends unless the patch placed it.
        if entity.scope() != previous_scope && !order_pinned {
            Ok(Placement::Append)
        } else {
            Ok(Placement::Keep)
        }
    });

    let updated = repo
        .update_with(id, edit)
        .await?
        .ok_or_else(|| not_found::<E>(id))?;
    info!(
        kind = E::KIND,
        %id,
        actor_id = %actor.id,
        display_order = updated.display_order(),
        "Updated entry"
    );
    Ok(updated)
}

pub async fn remove<E: Resource>(
    repo: &dyn EntityRepository<E>,
    actor: &Actor,
    id: Uuid,
) -> Result<(), AppError> {
    let entity = get(repo, id).await?;
    ensure_can_mutate(actor, entity.owner_id(), E::KIND)?;

    if !repo.soft_delete(id).await? {
        return Err(not_found::<E>(id));
    }
    info!(kind = E::KIND, %id, actor_id = %actor.id, "Soft-deleted entry");
    Ok(())
}

pub async fn restore<E: Resource>(
    repo: &dyn EntityRepository<E>,
    actor: &Actor,
    id: Uuid,
) -> Result<E, AppError> {
    let entity = repo
        .find_by_id(id, true)
        .await?
        .filter(|e| e.is_deleted())
        .ok_or_else(|| AppError::NotFound(format!("Deleted {} {id} not found", E::KIND)))?;
    ensure_can_mutate(actor, entity.owner_id(), E::KIND)?;

    let restored = repo.restore(id).await?.ok_or_else(|| not_found::<E>(id))?;
    info!(
        kind = E::KIND,
        %id,
        display_order = restored.display_order(),
        "Restored entry"
    );
    Ok(restored)
}

pub async fn list<E: Resource>(
    repo: &dyn EntityRepository<E>,
    config: &Config,
    filter: &E::Filter,
    params: &ListParams,
) -> Result<Page<E>, AppError> {
    let page = PageRequest::resolve(
        params.page,
        params.limit,
        config.default_page_size,
        config.max_page_size,
    )?;
    let sort = resolve_sort::<E::SortField>(
        params.sort_by.as_deref(),
        params.sort_direction.as_deref(),
        E::default_sort(),
    )?;
    let (data, total) = repo.query(filter, &sort, Some(&page)).await?;
    Ok(Page::new(data, total, &page))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::education::{CreateEducation, UpdateEducation};
    use crate::models::skill::{CreateSkill, SkillFilter, UpdateSkill};
    use crate::models::{Education, Skill};
    use crate::ordering::reorder::reorder;
    use crate::ordering::Scope;
    use crate::repository::memory::InMemoryRepository;

    fn new_skill(name: &str) -> CreateSkill {
        serde_json::from_value(json!({ "name": name, "category": "language" })).unwrap()
    }

    async fn seed(repo: &dyn EntityRepository<Skill>, owner: &Actor, names: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(create(repo, owner, new_skill(name)).await.unwrap().id);
        }
        ids
    }

    async fn order_of(repo: &dyn EntityRepository<Skill>, owner: &Actor) -> Vec<(Uuid, i32)> {
        repo.find_by_scope(&Scope::new(owner.id, None))
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.id, s.display_order))
            .collect()
    }

    #[tokio::test]
    async fn test_reorder_scenario_and_idempotence() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let ids = seed(repo, &owner, &["a", "b", "c"]).await;
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let scope = Scope::new(owner.id, None);

        let first = reorder(repo, &owner, scope, &[c, a, b]).await.unwrap();
        let got: Vec<(Uuid, i32)> = first.iter().map(|s| (s.id, s.display_order)).collect();
        assert_eq!(got, vec![(c, 0), (a, 1), (b, 2)]);

        reorder(repo, &owner, scope, &[c, a, b]).await.unwrap();
        assert_eq!(order_of(repo, &owner).await, got);
    }

    #[tokio::test]
    async fn test_rejected_reorder_changes_nothing() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let ids = seed(repo, &owner, &["a", "b", "c"]).await;
        let before = order_of(repo, &owner).await;
        let scope = Scope::new(owner.id, None);

        let partial = reorder(repo, &owner, scope, &[ids[2], ids[0]]).await;
        assert!(matches!(partial, Err(AppError::InvalidReorderSet(_))));

        let foreign = reorder(repo, &owner, scope, &[ids[2], ids[0], Uuid::new_v4()]).await;
        assert!(matches!(foreign, Err(AppError::InvalidReorderSet(_))));

        let stranger = Actor::user(Uuid::new_v4());
        let forbidden = reorder(repo, &stranger, scope, &[ids[2], ids[1], ids[0]]).await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        assert_eq!(order_of(repo, &owner).await, before);
    }

    #[tokio::test]
    async fn test_reorder_ignores_deleted_rows() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let ids = seed(repo, &owner, &["a", "b", "c"]).await;
        remove::<Skill>(repo, &owner, ids[1]).await.unwrap();

        let scope = Scope::new(owner.id, None);
        let with_deleted = reorder(repo, &owner, scope, &[ids[2], ids[1], ids[0]]).await;
        assert!(matches!(with_deleted, Err(AppError::InvalidReorderSet(_))));

        let rows = reorder(repo, &owner, scope, &[ids[2], ids[0]]).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_create_for_other_owner_forbidden() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let actor = Actor::user(Uuid::new_v4());
        let mut input = new_skill("Rust");
        input.owner_id = Some(Uuid::new_v4());
        assert!(matches!(
            create(repo, &actor, input).await,
            Err(AppError::Forbidden(_))
        ));

        let admin = Actor::admin(Uuid::new_v4());
        let mut input = new_skill("Rust");
        let owner_id = Uuid::new_v4();
        input.owner_id = Some(owner_id);
        assert_eq!(create(repo, &admin, input).await.unwrap().owner_id, owner_id);
    }

    #[tokio::test]
    async fn test_forbidden_update_and_remove_leave_row_intact() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let id = seed(repo, &owner, &["Rust"]).await[0];
        let before = get(repo, id).await.unwrap();

        let stranger = Actor::user(Uuid::new_v4());
        let patch = UpdateSkill {
            name: Some("Go".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update(repo, &stranger, id, patch).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            remove::<Skill>(repo, &stranger, id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(get(repo, id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_patch_after_reorder_keeps_new_order() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let ids = seed(repo, &owner, &["a", "b", "c"]).await;
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        let before_reorder = get(repo, a).await.unwrap();
        assert_eq!(before_reorder.display_order, 0);
        reorder(repo, &owner, Scope::new(owner.id, None), &[c, a, b])
            .await
            .unwrap();

        let patch = UpdateSkill {
            name: Some("A2".to_string()),
            ..Default::default()
        };
        let updated = update(repo, &owner, a, patch).await.unwrap();
        assert_eq!(updated.display_order, 1);
        assert_eq!(order_of(repo, &owner).await, vec![(c, 0), (a, 1), (b, 2)]);
    }

    #[tokio::test]
    async fn test_concurrent_patches_keep_both_fields() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let id = seed(repo, &owner, &["Rust"]).await[0];

        let rename = UpdateSkill {
            name: Some("Rust 2021".to_string()),
            ..Default::default()
        };
        let feature = UpdateSkill {
            is_featured: Some(true),
            ..Default::default()
        };
        let (first, second) = tokio::join!(
            update(repo, &owner, id, rename),
            update(repo, &owner, id, feature)
        );
        first.unwrap();
        second.unwrap();

        let stored = get(repo, id).await.unwrap();
        assert_eq!(stored.name, "Rust 2021");
        assert!(stored.is_featured);
    }

    #[tokio::test]
    async fn test_update_missing_or_deleted_is_not_found() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let id = seed(repo, &owner, &["Rust"]).await[0];
        remove::<Skill>(repo, &owner, id).await.unwrap();

        assert!(matches!(
            update(repo, &owner, id, UpdateSkill::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            remove::<Skill>(repo, &owner, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_display_order_on_create() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let mut input = new_skill("Rust");
        input.display_order = Some(7);
        assert_eq!(create(repo, &owner, input).await.unwrap().display_order, 7);
        assert_eq!(
            create(repo, &owner, new_skill("Go")).await.unwrap().display_order,
            8
        );
    }

    #[tokio::test]
    async fn test_moving_scope_appends() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let category = Uuid::new_v4();
        for name in ["a", "b"] {
            let mut input = new_skill(name);
            input.category_id = Some(category);
            create(repo, &owner, input).await.unwrap();
        }
        let loose = seed(repo, &owner, &["c"]).await[0];

        let patch = UpdateSkill {
            category_id: Some(Some(category)),
            ..Default::default()
        };
        let moved = update(repo, &owner, loose, patch).await.unwrap();
        assert_eq!(moved.category_id, Some(category));
        assert_eq!(moved.display_order, 2);
    }

    #[tokio::test]
    async fn test_restore_appends_at_end() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        let ids = seed(repo, &owner, &["a", "b", "c"]).await;
        remove::<Skill>(repo, &owner, ids[0]).await.unwrap();

        let restored = restore(repo, &owner, ids[0]).await.unwrap();
        assert_eq!(restored.display_order, 3);
        assert!(restored.deleted_at.is_none());

        assert!(matches!(
            restore(repo, &owner, ids[1]).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_current_education_drops_end_date() {
        let repo: &dyn EntityRepository<Education> = &InMemoryRepository::<Education>::new();
        let owner = Actor::user(Uuid::new_v4());
        let input: CreateEducation = serde_json::from_value(json!({
            "institution": "ETH",
            "degree": "MSc",
            "start_date": "2018-09-01",
            "end_date": "2020-06-30",
        }))
        .unwrap();
        let created = create(repo, &owner, input).await.unwrap();
        assert!(!created.is_current);
        assert!(created.end_date.is_some());

        let patch = UpdateEducation {
            is_current: Some(true),
            ..Default::default()
        };
        let updated = update(repo, &owner, created.id, patch).await.unwrap();
        assert!(updated.is_current);
        assert_eq!(updated.end_date, None);
    }

    #[tokio::test]
    async fn test_inverted_patch_dates_rejected() {
        let repo: &dyn EntityRepository<Education> = &InMemoryRepository::<Education>::new();
        let owner = Actor::user(Uuid::new_v4());
        let input: CreateEducation = serde_json::from_value(json!({
            "institution": "ETH",
            "degree": "MSc",
            "start_date": "2018-09-01",
        }))
        .unwrap();
        let created = create(repo, &owner, input).await.unwrap();

        let patch: UpdateEducation =
            serde_json::from_value(json!({ "end_date": "2017-01-01" })).unwrap();
        assert!(matches!(
            update(repo, &owner, created.id, patch).await,
            Err(AppError::InvalidDateRange(_))
        ));
        assert_eq!(get(repo, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_list_pages_past_the_end() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let owner = Actor::user(Uuid::new_v4());
        for i in 0..25 {
            create(repo, &owner, new_skill(&format!("skill {i}"))).await.unwrap();
        }
        let config = Config::default();
        let filter = SkillFilter::default();

        let params = |page| ListParams {
            page: Some(page),
            limit: Some(10),
            ..Default::default()
        };
        let page3 = list(repo, &config, &filter, &params(3)).await.unwrap();
        assert_eq!(page3.data.len(), 5);
        assert_eq!(page3.meta.total, 25);
        assert_eq!(page3.meta.total_pages, 3);
        assert_eq!(page3.data[0].display_order, 20);

        let page4 = list(repo, &config, &filter, &params(4)).await.unwrap();
        assert!(page4.data.is_empty());
        assert_eq!(page4.meta.total, 25);
        assert_eq!(page4.meta.total_pages, 3);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_page() {
        let repo: &dyn EntityRepository<Skill> = &InMemoryRepository::<Skill>::new();
        let params = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            list(repo, &Config::default(), &SkillFilter::default(), &params).await,
            Err(AppError::Validation(_))
        ));
    }
}
