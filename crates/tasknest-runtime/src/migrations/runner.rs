//! Migration runner.
//!
//! Concurrent starts are serialized with a PostgreSQL advisory lock, so only
//! one process applies migrations at a time.

use std::collections::HashSet;
use std::path::Path;

use sqlx::PgPool;
use tasknest_core::error::{Result, TaskNestError};
use tracing::{debug, info, warn};

/// Advisory lock key, "TASKNEST" in ASCII.
const MIGRATION_LOCK_ID: i64 = 0x5441_534B_4E45_5354;

/// A single migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique name, e.g. "0001_todo_schema".
    pub name: String,
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Whether a migration has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub applied: bool,
}

pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply every pending migration in order. Returns the names applied.
    pub async fn run(&self, migrations: &[Migration]) -> Result<Vec<String>> {
        self.acquire_lock().await?;

        let result = self.run_locked(migrations).await;

        if let Err(e) = self.release_lock().await {
            warn!("Failed to release migration lock: {}", e);
        }

        result
    }

    /// Report which migrations have been applied.
    pub async fn status(&self, migrations: &[Migration]) -> Result<Vec<MigrationStatus>> {
        self.ensure_migrations_table().await?;
        let applied = self.applied_migrations().await?;

        Ok(migrations
            .iter()
            .map(|m| MigrationStatus {
                name: m.name.clone(),
                applied: applied.contains(&m.name),
            })
            .collect())
    }

    async fn run_locked(&self, migrations: &[Migration]) -> Result<Vec<String>> {
        self.ensure_migrations_table().await?;

        let applied = self.applied_migrations().await?;
        debug!("Already applied migrations: {:?}", applied);

        let mut newly_applied = Vec::new();
        for migration in migrations {
            if !applied.contains(&migration.name) {
                self.apply(migration).await?;
                newly_applied.push(migration.name.clone());
            }
        }
        Ok(newly_applied)
    }

    async fn acquire_lock(&self) -> Result<()> {
        debug!("Acquiring migration lock...");
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                TaskNestError::Database(format!("Failed to acquire migration lock: {}", e))
            })?;
        Ok(())
    }

    async fn release_lock(&self) -> Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                TaskNestError::Database(format!("Failed to release migration lock: {}", e))
            })?;
        debug!("Migration lock released");
        Ok(())
    }

    async fn ensure_migrations_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasknest_migrations (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) UNIQUE NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            TaskNestError::Database(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }

    async fn applied_migrations(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM tasknest_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                TaskNestError::Database(format!("Failed to read applied migrations: {}", e))
            })?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Apply one migration and record it, atomically.
    async fn apply(&self, migration: &Migration) -> Result<()> {
        info!("Applying migration: {}", migration.name);
        let failed = |e: sqlx::Error| {
            TaskNestError::Database(format!(
                "Failed to apply migration '{}': {}",
                migration.name, e
            ))
        };

        let mut tx = self.pool.begin().await.map_err(failed)?;
        for statement in split_sql_statements(&migration.sql) {
            if is_comment_only(&statement) {
                continue;
            }
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
        }

        sqlx::query("INSERT INTO tasknest_migrations (name) VALUES ($1)")
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        info!("Migration applied: {}", migration.name);
        Ok(())
    }
}

fn is_comment_only(statement: &str) -> bool {
    statement.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    })
}

/// Split SQL into statements on semicolons outside dollar-quoted bodies.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut open_tag: Option<String> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        if c == '$' {
            let mut tag = String::from("$");
            while let Some(&next) = chars.peek() {
                if next == '$' || next.is_alphanumeric() || next == '_' {
                    chars.next();
                    tag.push(next);
                    current.push(next);
                    if next == '$' {
                        break;
                    }
                } else {
                    break;
                }
            }

            if tag.len() >= 2 && tag.ends_with('$') {
                match &open_tag {
                    Some(open) if *open == tag => open_tag = None,
                    None => open_tag = Some(tag),
                    Some(_) => {}
                }
            }
        }

        if c == ';' && open_tag.is_none() {
            push_statement(&mut statements, &current);
            current.clear();
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim().trim_end_matches(';').trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

/// Load extra migrations from `*.sql` files in a directory, sorted by name.
pub fn load_migrations_from_dir(dir: &Path) -> Result<Vec<Migration>> {
    if !dir.exists() {
        debug!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut migrations = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "sql").unwrap_or(false) {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| TaskNestError::Config("Invalid migration filename".into()))?
                .to_string();
            let sql = std::fs::read_to_string(&path)?;
            migrations.push(Migration::new(name, sql));
        }
    }

    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Loaded {} migrations from {:?}", migrations.len(), dir);
    Ok(migrations)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_from_missing_dir() {
        let migrations = load_migrations_from_dir(Path::new("/nonexistent/path")).unwrap();
        assert!(migrations.is_empty());
    }

    #[test]
    fn test_load_sorted_and_sql_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("0003_tags.sql"), "SELECT 3;").unwrap();
        fs::write(dir.path().join("0002_index.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a migration").unwrap();
        fs::write(dir.path().join("0004_old.sql.bak"), "SELECT 4;").unwrap();

        let migrations = load_migrations_from_dir(dir.path()).unwrap();
        let names: Vec<_> = migrations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["0002_index", "0003_tags"]);
    }

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_sql_statements("SELECT 1; SELECT 2;\nSELECT 3");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_keeps_dollar_quoted_body() {
        let sql = r#"
CREATE FUNCTION touch_updated_at() RETURNS trigger AS $body$
BEGIN
    NEW.updated_at := NOW();
    RETURN NEW;
END;
$body$ LANGUAGE plpgsql;

SELECT 1;
"#;
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("NEW.updated_at := NOW();"));
        assert!(stmts[0].ends_with("LANGUAGE plpgsql"));
    }

    #[test]
    fn test_builtin_schema_splits_into_statements() {
        let sql = &super::super::builtin_migrations()[0].sql;
        let stmts: Vec<_> = split_sql_statements(sql)
            .into_iter()
            .filter(|s| !is_comment_only(s))
            .collect();
        assert_eq!(stmts.len(), 6);
    }

    #[test]
    fn test_comment_only() {
        assert!(is_comment_only("-- nothing\n\n"));
        assert!(!is_comment_only("-- header\nSELECT 1"));
    }
}
