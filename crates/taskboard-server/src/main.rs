//! Taskboard - multi-tenant task and project management server

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use taskboard_core::config::Config;
use taskboard_core::storage::{Database, DatabaseConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(author, version, about = "Task and project management server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// SQLite database file (overrides database.path)
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Apply pending database migrations
    Migrate {
        /// SQLite database file (overrides database.path)
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskboard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, database } => cmd_serve(host, port, database).await,
        Commands::Migrate { database } => cmd_migrate(database, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

async fn cmd_serve(host: Option<String>, port: Option<u16>, database: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load()?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    let context = taskboard_server::build_context(config, database).await?;
    taskboard_server::api::setup_and_serve(context, addr).await
}

async fn cmd_migrate(database: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let path = database.unwrap_or_else(|| config.database_path());

    let db = Database::new(DatabaseConfig::with_path(&path).no_migrate()).await?;
    let before = db.migration_status().await?;
    db.migrate().await?;
    let after = db.migration_status().await?;
    db.close().await;

    info!(
        from = before.current_version,
        to = after.current_version,
        path = %path.display(),
        "Migrations applied"
    );
    if !quiet {
        if before.needs_migration {
            println!(
                "Migrated {} from version {} to {}",
                path.display(),
                before.current_version,
                after.current_version
            );
        } else {
            println!("Database is up to date (version {})", after.current_version);
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
