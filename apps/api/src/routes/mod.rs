pub mod health;
pub mod resources;
pub mod skills;

use axum::{http::Uri, routing::get, Router};

use crate::errors::AppError;
use crate::models::{Education, Experience, Skill};
use crate::state::AppState;
use resources::resource_router;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest(
            "/api/v1/skills",
            resource_router::<Skill>().route("/grouped", get(skills::handle_grouped)),
        )
        .nest("/api/v1/education", resource_router::<Education>())
        .nest("/api/v1/experiences", resource_router::<Experience>())
        .fallback(handle_unknown_route)
        .with_state(state)
}

async fn handle_unknown_route(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
