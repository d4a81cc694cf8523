use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tasknest::TaskNest;
use tasknest_core::config::TaskNestConfig;
use tasknest_runtime::{Database, MigrationRunner};

/// Manage database migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    #[command(subcommand)]
    pub action: MigrateAction,

    /// Directory of additional SQL migrations.
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Apply all pending migrations.
    Up,

    /// Show migration status.
    Status,
}

impl MigrateCommand {
    pub async fn execute(self, config: TaskNestConfig) -> Result<()> {
        if !config.database.is_postgres() {
            anyhow::bail!("Migrations need database.url (or DATABASE_URL) to be set");
        }

        let db = Database::from_config(&config.database).await?;
        let mut builder = TaskNest::builder().config(config);
        if let Some(dir) = &self.migrations_dir {
            builder = builder.migrations_dir(dir);
        }
        let migrations = builder.build()?.migrations()?;
        let runner = MigrationRunner::new(db.pool().clone());

        println!();
        match self.action {
            MigrateAction::Up => {
                println!("  {} Running pending migrations...", style("→").dim());
                let applied = runner.run(&migrations).await?;
                for name in &applied {
                    println!("  {} Applied: {}", style("✓").green(), name);
                }
                println!(
                    "  {} {} migration(s) applied",
                    style("✓").green(),
                    applied.len()
                );
            }
            MigrateAction::Status => {
                let status = runner.status(&migrations).await?;
                let pending = status.iter().filter(|m| !m.applied).count();
                for m in &status {
                    if m.applied {
                        println!("  {} {}", style("✓").green(), style(&m.name).cyan());
                    } else {
                        println!("  {} {}", style("○").yellow(), style(&m.name).yellow());
                    }
                }
                println!();
                println!(
                    "  {} {} applied, {} pending",
                    style("ℹ").blue(),
                    status.len() - pending,
                    pending
                );
            }
        }
        println!();

        db.close().await;
        Ok(())
    }
}
