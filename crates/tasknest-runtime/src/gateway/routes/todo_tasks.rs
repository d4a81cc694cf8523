use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tasknest_core::dto::{AddTodoTaskCmd, EditTodoTaskCmd, TodoTaskWithItem};
use uuid::Uuid;

use crate::gateway::extract::{ApiJson, ApiPath, Caller};
use crate::gateway::response::{created, ApiResult};
use crate::gateway::server::AppState;

const COLLECTION: &str = "/api/todotasks";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(COLLECTION, get(list).post(add))
        .route("/api/todotasks/{guid}", get(get_one).put(edit).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<TodoTaskWithItem>>> {
    Ok(Json(state.services.todo_tasks.list(&caller.owner, &()).await?))
}

async fn get_one(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
) -> ApiResult<Json<TodoTaskWithItem>> {
    Ok(Json(state.services.todo_tasks.get(&caller.owner, guid).await?))
}

async fn add(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(cmd): ApiJson<AddTodoTaskCmd>,
) -> ApiResult<Response> {
    let guid = state.services.todo_tasks.add(&caller.owner, cmd).await?;
    Ok(created(COLLECTION, guid))
}

async fn edit(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
    ApiJson(cmd): ApiJson<EditTodoTaskCmd>,
) -> ApiResult<StatusCode> {
    state.services.todo_tasks.edit(&caller.owner, guid, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.todo_tasks.delete(&caller.owner, guid, &()).await?;
    Ok(StatusCode::NO_CONTENT)
}
