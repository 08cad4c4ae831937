//! Taskboard HTTP server
//!
//! Axum routes over the `taskboard-core` services. The binary in `main.rs`
//! wires configuration, storage and mail, then calls [`api::setup_and_serve`].

pub mod api;

use std::sync::Arc;

use anyhow::Context;
use taskboard_core::application::Services;
use taskboard_core::auth::{Mailer, Passwords, mailer_from_config};
use taskboard_core::config::Config;
use taskboard_core::storage::{Database, DatabaseConfig};

pub use api::app;
pub use api::context::ApiContext;

/// Open the configured database and wire every service
///
/// `database` overrides the path from configuration.
pub async fn build_context(config: Config, database: Option<std::path::PathBuf>) -> anyhow::Result<ApiContext> {
    let secret = config
        .auth
        .resolved_jwt_secret()?
        .context("TASKBOARD_JWT_SECRET (or JWT_SECRET) must be set to sign session tokens")?;
    let mailer: Arc<dyn Mailer> = mailer_from_config(&config.email)?;

    let path = database.unwrap_or_else(|| config.database_path());
    let db = Database::new(DatabaseConfig::with_path(&path).max_connections(config.database.max_connections))
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    Ok(context_with(db, config, &secret, Passwords::default(), mailer))
}

/// Wire services over an already open database
pub fn context_with(
    db: Database,
    config: Config,
    secret: &str,
    passwords: Passwords,
    mailer: Arc<dyn Mailer>,
) -> ApiContext {
    let services = Services::new(db.clone(), &config, secret, passwords, mailer);
    ApiContext::new(db, config, services)
}
