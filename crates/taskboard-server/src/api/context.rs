use std::sync::Arc;

use taskboard_core::application::Services;
use taskboard_core::config::Config;
use taskboard_core::storage::Database;

#[derive(Clone)]
pub struct ApiContext {
    /// Shared pool; services hold their own handles to the same pool
    pub db: Database,
    pub config: Arc<Config>,
    pub services: Services,
}

impl ApiContext {
    pub fn new(db: Database, config: Config, services: Services) -> Self {
        Self {
            db,
            config: Arc::new(config),
            services,
        }
    }
}
