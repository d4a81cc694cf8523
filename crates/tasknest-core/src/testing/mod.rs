//! Testing utilities.
//!
//! Service and gateway tests run against [`MemoryStore`](crate::store::MemoryStore).
//! PostgreSQL tests are opt-in: they connect through [`TestDatabase::from_env`],
//! which reads `TEST_DATABASE_URL`, and skip when it is unset.

pub mod assertions;
pub mod db;

pub use assertions::*;
pub use db::{IsolatedTestDb, TestDatabase};
