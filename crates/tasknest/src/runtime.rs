use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;

use tasknest_core::config::TaskNestConfig;
use tasknest_core::error::{Result, TaskNestError};
use tasknest_core::{MemoryStore, Store};
use tasknest_runtime::migrations::{builtin_migrations, load_migrations_from_dir, Migration};
use tasknest_runtime::{Database, GatewayServer, MigrationRunner, PgStore};

/// An opened store, plus the pool behind it when it is PostgreSQL.
pub struct StoreHandle {
    pub store: Arc<dyn Store>,
    pub database: Option<Database>,
}

impl StoreHandle {
    /// Close pooled connections, if any.
    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}

/// The TaskNest service.
pub struct TaskNest {
    config: TaskNestConfig,
    /// Extra migration files applied after the built-in schema.
    migrations_dir: Option<PathBuf>,
    extra_migrations: Vec<Migration>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl TaskNest {
    pub fn builder() -> TaskNestBuilder {
        TaskNestBuilder::new()
    }

    pub fn config(&self) -> &TaskNestConfig {
        &self.config
    }

    /// Every migration this instance knows about, in apply order.
    pub fn migrations(&self) -> Result<Vec<Migration>> {
        let mut migrations = builtin_migrations();
        if let Some(dir) = &self.migrations_dir {
            migrations.extend(load_migrations_from_dir(dir)?);
        }
        migrations.extend(self.extra_migrations.iter().cloned());
        Ok(migrations)
    }

    /// Open the configured store.
    ///
    /// A database URL selects PostgreSQL, migrated on open when
    /// `migrate_on_start` is set. Otherwise data lives in memory.
    pub async fn open_store(&self) -> Result<StoreHandle> {
        if !self.config.database.is_postgres() {
            tracing::warn!("No database.url configured; using the in-memory store");
            return Ok(StoreHandle {
                store: Arc::new(MemoryStore::new()),
                database: None,
            });
        }

        let db = Database::from_config(&self.config.database).await?;
        tracing::info!("Connected to database");

        if self.config.database.migrate_on_start {
            let applied = MigrationRunner::new(db.pool().clone())
                .run(&self.migrations()?)
                .await?;
            tracing::info!(count = applied.len(), "Migrations completed");
        }

        Ok(StoreHandle {
            store: Arc::new(PgStore::new(db.pool().clone())),
            database: Some(db),
        })
    }

    /// Sender that stops a running instance.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve until Ctrl-C or a shutdown notification.
    pub async fn run(self) -> Result<()> {
        tracing::info!(project = %self.config.project.name, "TaskNest starting");

        let handle = self.open_store().await?;
        tracing::info!(backend = handle.store.backend(), "Store ready");

        let server = GatewayServer::new(
            self.config.gateway.clone(),
            &self.config.auth,
            handle.store.clone(),
        )?;

        let mut shutdown_rx = self.shutdown_rx;
        let signal = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown notification");
                }
            }
        };

        let served = server.run(signal).await;

        tracing::info!("Starting graceful shutdown...");
        handle.close().await;
        tracing::info!("TaskNest stopped");

        served.map_err(TaskNestError::from)
    }
}

/// Builder for [`TaskNest`].
pub struct TaskNestBuilder {
    config: Option<TaskNestConfig>,
    migrations_dir: Option<PathBuf>,
    extra_migrations: Vec<Migration>,
}

impl TaskNestBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            migrations_dir: None,
            extra_migrations: Vec::new(),
        }
    }

    /// Directory of additional `*.sql` migrations.
    pub fn migrations_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.migrations_dir = Some(path.into());
        self
    }

    /// Add a migration programmatically.
    pub fn migration(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.extra_migrations.push(Migration::new(name, sql));
        self
    }

    pub fn config(mut self, config: TaskNestConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<TaskNest> {
        let config = self
            .config
            .ok_or_else(|| TaskNestError::Config("Configuration is required".to_string()))?;

        // Subscribed up front so a shutdown sent before `run` is not lost.
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(TaskNest {
            config,
            migrations_dir: self.migrations_dir,
            extra_migrations: self.extra_migrations,
            shutdown_tx,
            shutdown_rx,
        })
    }
}

impl Default for TaskNestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
