//! Business logic services

pub mod auth;
pub mod circulation;

use crate::{
    config::{AuthConfig, CirculationConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub circulation: circulation::CirculationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        circulation_config: CirculationConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            circulation: circulation::CirculationService::new(repository, circulation_config),
        }
    }
}
