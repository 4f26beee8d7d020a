use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::models::skill::{group_by_category, SkillFilter, SkillGroup};
use crate::models::Skill;
use crate::ordering::Resource;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GroupedQuery {
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
}

/// GET /api/v1/skills/grouped
pub async fn handle_grouped(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<GroupedQuery>,
) -> Result<Json<DataResponse<Vec<SkillGroup>>>, AppError> {
    let filter = SkillFilter {
        owner_id: Some(params.owner_id),
        category_id: params.category_id,
        ..Default::default()
    };
    let (skills, _) = state
        .skills
        .query(&filter, &Skill::default_sort(), None)
        .await?;
    Ok(Json(DataResponse::new(group_by_category(skills))))
}
