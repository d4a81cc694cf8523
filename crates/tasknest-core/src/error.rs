use thiserror::Error;
use validator::ValidationErrors;

/// Core error type for TaskNest operations.
#[derive(Error, Debug)]
pub enum TaskNestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or out-of-range input, reported per field.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Resource absent or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Delete blocked by dependent rows.
    #[error("{0}")]
    Integrity(String),

    /// Uniqueness, foreign key or check rejection raised by the store.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaskNestError {
    /// Not-found error for a resource kind and guid.
    pub fn not_found(kind: &str, guid: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {} not found", kind, guid))
    }

    /// Whether this error means the store rejected a write.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl From<sqlx::Error> for TaskNestError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    TaskNestError::Constraint(db.message().to_string())
                }
                _ => TaskNestError::Database(e.to_string()),
            },
            _ => TaskNestError::Database(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for TaskNestError {
    fn from(e: ValidationErrors) -> Self {
        TaskNestError::Validation(e)
    }
}

impl From<serde_json::Error> for TaskNestError {
    fn from(e: serde_json::Error) -> Self {
        TaskNestError::BadRequest(e.to_string())
    }
}

/// Result type alias using TaskNestError.
pub type Result<T> = std::result::Result<T, TaskNestError>;
