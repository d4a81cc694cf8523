mod migrate;
mod serve;
mod user;

pub use migrate::MigrateCommand;
pub use serve::ServeCommand;
pub use user::UserCommand;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasknest_core::config::{LoggingConfig, TaskNestConfig};
use tracing_subscriber::EnvFilter;

/// TaskNest - owner-scoped todo service
#[derive(Parser)]
#[command(name = "tasknest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "tasknest.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeCommand),

    /// Manage database migrations.
    Migrate(MigrateCommand),

    /// Manage users with password credentials.
    User(UserCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        dotenvy::dotenv().ok();

        let config = load_config(Path::new(&self.config))?;
        init_logging(&config.observability.logging);

        match self.command {
            Commands::Serve(cmd) => cmd.execute(config).await,
            Commands::Migrate(cmd) => cmd.execute(config).await,
            Commands::User(cmd) => cmd.execute(config).await,
        }
    }
}

/// Load the config file, or defaults when it is absent.
///
/// Without a file, `DATABASE_URL` still selects PostgreSQL.
pub fn load_config(path: &Path) -> Result<TaskNestConfig> {
    if path.exists() {
        return TaskNestConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()));
    }

    Ok(match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => TaskNestConfig::default_with_database_url(&url),
        _ => TaskNestConfig::default(),
    })
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let result = if config.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
