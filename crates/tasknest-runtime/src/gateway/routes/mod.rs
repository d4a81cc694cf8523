//! HTTP handlers, one module per resource.

mod categories;
mod oauth;
mod todo_items;
mod todo_tasks;

use axum::Router;

use super::server::AppState;

/// All API and principal routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(categories::router())
        .merge(todo_items::router())
        .merge(todo_tasks::router())
        .merge(oauth::router())
}
