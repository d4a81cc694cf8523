mod database;
mod observability;

pub use database::DatabaseConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TaskNestError};

/// Root configuration for TaskNest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskNestConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Database configuration. Without a URL the in-memory store is used.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Principal resolution configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl TaskNestConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TaskNestError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| TaskNestError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Configuration backed by PostgreSQL at the given URL.
    pub fn default_with_database_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: Some(url.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "tasknest".to_string()
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Authentication configuration.
///
/// Configuring a JWT secret switches principal resolution from the fixed
/// guest identity to authenticated principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for token validation.
    pub jwt_secret: Option<String>,

    /// JWT algorithm (HS256, HS384, HS512).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Owner name used when no auth provider is configured.
    #[serde(default = "default_guest_name")]
    pub guest_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            algorithm: default_algorithm(),
            guest_name: default_guest_name(),
        }
    }
}

impl AuthConfig {
    /// Whether an auth provider is configured.
    pub fn has_provider(&self) -> bool {
        self.jwt_secret
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_guest_name() -> String {
    "guest".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
