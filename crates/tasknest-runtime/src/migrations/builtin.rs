//! Migrations shipped with the binary.

use super::runner::Migration;

const TODO_SCHEMA_SQL: &str = include_str!("../../migrations/0001_todo_schema.sql");

/// Schema migrations in the order they apply.
pub fn builtin_migrations() -> Vec<Migration> {
    vec![Migration::new("0001_todo_schema", TODO_SCHEMA_SQL)]
}
