//! Application service layer
//!
//! This layer orchestrates domain operations, handles transactions,
//! and provides the public API that the HTTP layer calls into.

pub mod auth_service;
pub mod project_service;
pub mod stats_service;
pub mod task_service;
pub mod validators;

use std::sync::Arc;

use chrono::Duration;

pub use auth_service::{AuthService, LoginRequest, LoginResponse, RESET_REQUESTED_MESSAGE, RegisterRequest};
pub use project_service::{CreateProjectRequest, ProjectService, UpdateProjectRequest};
pub use stats_service::StatsService;
pub use task_service::{
    AddCommentRequest, AddSubtaskRequest, CreateTaskRequest, TaskService, UpdateAssigneesRequest,
    UpdateDescriptionRequest, UpdatePriorityRequest, UpdateStatusRequest, UpdateSubtaskRequest,
    UpdateTitleRequest,
};

use crate::auth::{Mailer, Passwords, TokenIssuer};
use crate::config::Config;
use crate::storage::Database;

/// Every service, wired to one database
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub stats: StatsService,
}

impl Services {
    /// Wire services from configuration
    ///
    /// The signing secret and mailer come from the caller so that the binary
    /// can resolve them from the environment and tests can inject their own.
    pub fn new(
        db: Database,
        config: &Config,
        jwt_secret: &str,
        passwords: Passwords,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = TokenIssuer::new(
            jwt_secret.as_bytes(),
            Duration::hours(config.auth.session_ttl_hours),
            Duration::minutes(config.auth.reset_ttl_minutes),
        );

        Self {
            auth: AuthService::new(
                db.clone(),
                passwords,
                tokens,
                mailer,
                config.server.client_url.clone(),
                config.email.from_name.clone(),
            ),
            projects: ProjectService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            stats: StatsService::new(db),
        }
    }
}
