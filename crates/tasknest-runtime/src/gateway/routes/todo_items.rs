use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tasknest_core::dto::{
    AddTodoItemCmd, DeleteTodoItemQuery, EditTodoItemCmd, TodoItemDetail, TodoItemQuery,
    TodoItemSummary,
};
use uuid::Uuid;

use crate::gateway::extract::{ApiJson, ApiPath, ApiQuery, Caller};
use crate::gateway::response::{created, ApiResult};
use crate::gateway::server::AppState;

const COLLECTION: &str = "/api/todoitems";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(COLLECTION, get(list).post(add))
        .route("/api/todoitems/{guid}", get(get_one).put(edit).delete(remove))
}

/// Filtered by `?category=` (case-insensitive name) and `?isCompleted=`.
async fn list(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<TodoItemQuery>,
) -> ApiResult<Json<Vec<TodoItemSummary>>> {
    Ok(Json(state.services.todo_items.list(&caller.owner, &query).await?))
}

async fn get_one(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
) -> ApiResult<Json<TodoItemDetail>> {
    Ok(Json(state.services.todo_items.get(&caller.owner, guid).await?))
}

async fn add(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(cmd): ApiJson<AddTodoItemCmd>,
) -> ApiResult<Response> {
    let guid = state.services.todo_items.add(&caller.owner, cmd).await?;
    Ok(created(COLLECTION, guid))
}

async fn edit(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
    ApiJson(cmd): ApiJson<EditTodoItemCmd>,
) -> ApiResult<StatusCode> {
    state.services.todo_items.edit(&caller.owner, guid, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
    ApiQuery(options): ApiQuery<DeleteTodoItemQuery>,
) -> ApiResult<StatusCode> {
    state
        .services
        .todo_items
        .delete(&caller.owner, guid, &options)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
