//! Handlers shared by every ordered resource. Each is generic over the
//! resource type and mounted once per resource in [`super::build_router`].

use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::actor::Actor;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::ordering::query::{ListParams, Page};
use crate::ordering::reorder::{self, ReorderRequest};
use crate::ordering::{service, Resource};
use crate::response::DataResponse;
use crate::state::{AppState, RepositoryFor};

/// `/`, `/reorder`, `/:id` and `/:id/restore` for resource `E`.
pub fn resource_router<E: Resource>() -> Router<AppState>
where
    AppState: RepositoryFor<E>,
{
    Router::new()
        .route(
            "/",
            get(handle_list::<E>)
                .post(handle_create::<E>)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/reorder",
            post(handle_reorder::<E>).fallback(handle_method_not_allowed),
        )
        .route(
            "/:id",
            get(handle_get::<E>)
                .patch(handle_update::<E>)
                .delete(handle_delete::<E>)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/:id/restore",
            post(handle_restore::<E>).fallback(handle_method_not_allowed),
        )
}

/// Any method a resource path does not serve.
pub async fn handle_method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::MethodNotAllowed(format!("{method} is not supported on {}", uri.path()))
}

/// GET /api/v1/{resource}
pub async fn handle_list<E: Resource>(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
    AppQuery(filter): AppQuery<E::Filter>,
) -> Result<Json<Page<E>>, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let page = service::list(repo, &state.config, &filter, &params).await?;
    Ok(Json(page))
}

/// POST /api/v1/{resource}
pub async fn handle_create<E: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(input): AppJson<E::Create>,
) -> Result<(StatusCode, Json<DataResponse<E>>), AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let created = service::create(repo, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

/// GET /api/v1/{resource}/:id
pub async fn handle_get<E: Resource>(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DataResponse<E>>, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let entity = service::get(repo, id).await?;
    Ok(Json(DataResponse::new(entity)))
}

/// PATCH /api/v1/{resource}/:id
pub async fn handle_update<E: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<E::Patch>,
) -> Result<Json<DataResponse<E>>, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let updated = service::update(repo, &actor, id, patch).await?;
    Ok(Json(DataResponse::new(updated)))
}

/// DELETE /api/v1/{resource}/:id
pub async fn handle_delete<E: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    service::remove::<E>(repo, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/{resource}/:id/restore
pub async fn handle_restore<E: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DataResponse<E>>, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let restored = service::restore(repo, &actor, id).await?;
    Ok(Json(DataResponse::new(restored)))
}

/// POST /api/v1/{resource}/reorder
pub async fn handle_reorder<E: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<ReorderRequest>,
) -> Result<Json<DataResponse<Vec<E>>>, AppError>
where
    AppState: RepositoryFor<E>,
{
    let repo = RepositoryFor::<E>::repository(&state);
    let entities = reorder::reorder(repo, &actor, req.scope(), &req.ids_in_order).await?;
    Ok(Json(DataResponse::new(entities)))
}
