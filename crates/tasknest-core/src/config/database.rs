use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    #[serde(default)]
    pub url: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// Apply pending migrations on startup.
    #[serde(default = "default_true")]
    pub migrate_on_start: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            migrate_on_start: true,
        }
    }
}

impl DatabaseConfig {
    /// Whether a PostgreSQL backend is configured.
    pub fn is_postgres(&self) -> bool {
        self.url.as_deref().map(|u| !u.is_empty()).unwrap_or(false)
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
