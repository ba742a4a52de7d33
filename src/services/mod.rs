//! Business logic services

pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod members;
pub mod reminders;
pub mod stats;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub circulation: circulation::CirculationService,
    pub stats: stats::StatsService,
    pub reminders: reminders::RemindersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                config.loans.clone(),
            ),
            stats: stats::StatsService::new(repository.clone()),
            reminders: reminders::RemindersService::new(repository),
        }
    }
}
