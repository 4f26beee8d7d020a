use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::models::{Education, Experience, Skill};
use crate::ordering::Resource;
use crate::repository::memory::InMemoryRepository;
use crate::repository::postgres::PgRepository;
use crate::repository::EntityRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub skills: Arc<dyn EntityRepository<Skill>>,
    pub education: Arc<dyn EntityRepository<Education>>,
    pub experiences: Arc<dyn EntityRepository<Experience>>,
}

impl AppState {
    pub fn postgres(config: Config, pool: PgPool) -> Self {
        AppState {
            config,
            skills: Arc::new(PgRepository::<Skill>::new(pool.clone())),
            education: Arc::new(PgRepository::<Education>::new(pool.clone())),
            experiences: Arc::new(PgRepository::<Experience>::new(pool)),
        }
    }

    pub fn in_memory(config: Config) -> Self {
        AppState {
            config,
            skills: Arc::new(InMemoryRepository::<Skill>::new()),
            education: Arc::new(InMemoryRepository::<Education>::new()),
            experiences: Arc::new(InMemoryRepository::<Experience>::new()),
        }
    }
}

/// Resolves the repository for resource `E`, letting handlers stay generic.
pub trait RepositoryFor<E: Resource> {
    fn repository(&self) -> &dyn EntityRepository<E>;
}

impl RepositoryFor<Skill> for AppState {
    fn repository(&self) -> &dyn EntityRepository<Skill> {
        self.skills.as_ref()
    }
}

impl RepositoryFor<Education> for AppState {
    fn repository(&self) -> &dyn EntityRepository<Education> {
        self.education.as_ref()
    }
}

impl RepositoryFor<Experience> for AppState {
    fn repository(&self) -> &dyn EntityRepository<Experience> {
        self.experiences.as_ref()
    }
}
