//! Runtime pieces of TaskNest: the PostgreSQL store, schema migrations and
//! the HTTP gateway.

pub mod db;
pub mod gateway;
pub mod migrations;

pub use db::{Database, PgStore};
pub use gateway::{ApiError, AppState, AuthMiddleware, GatewayServer};
pub use migrations::{builtin_migrations, Migration, MigrationRunner, MigrationStatus};
