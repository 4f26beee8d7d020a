use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The caller on whose behalf a request runs.
///
/// Identity is established upstream (gateway / session layer) and forwarded in
/// the `x-actor-id` and `x-actor-role` headers. Services take the actor as an
/// explicit argument instead of reading request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Actor {
            id,
            role: Role::User,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Actor {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {ACTOR_ID_HEADER} header")))?;

        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| {
            AppError::Unauthorized(format!("{ACTOR_ID_HEADER} must be a UUID"))
        })?;

        let role = match parts.headers.get(ACTOR_ROLE_HEADER) {
            None => Role::User,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(Role::parse)
                .ok_or_else(|| {
                    AppError::Unauthorized(format!(
                        "{ACTOR_ROLE_HEADER} must be 'user' or 'admin'"
                    ))
                })?,
        };

        Ok(Actor { id, role })
    }
}
