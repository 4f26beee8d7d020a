use uuid::Uuid;

use crate::actor::Actor;
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(String),
}

impl Authorization {
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Authorization::Allowed => Ok(()),
            Authorization::Denied(reason) => Err(AppError::Forbidden(reason)),
        }
    }
}

/// Admins may act on anything; everyone else only on what they own.
pub fn authorize(actor: &Actor, owner_id: Uuid) -> Authorization {
    if actor.is_admin() || actor.id == owner_id {
        Authorization::Allowed
    } else {
        Authorization::Denied(format!(
            "Actor {} does not own resources of user {owner_id}",
            actor.id
        ))
    }
}

/// `authorize` as a `Result`, logging denials.
pub fn ensure_can_mutate(actor: &Actor, owner_id: Uuid, kind: &str) -> Result<(), AppError> {
    let decision = authorize(actor, owner_id);
    if let Authorization::Denied(reason) = &decision {
        tracing::warn!(actor_id = %actor.id, %owner_id, kind, "Forbidden mutation: {reason}");
    }
    decision.into_result()
}
