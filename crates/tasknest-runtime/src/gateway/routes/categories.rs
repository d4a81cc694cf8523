use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tasknest_core::dto::{AddCategoryCmd, CategoryView, EditCategoryCmd};
use uuid::Uuid;

use crate::gateway::extract::{ApiJson, ApiPath, Caller};
use crate::gateway::response::{created, ApiResult};
use crate::gateway::server::AppState;

const COLLECTION: &str = "/api/categories";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(COLLECTION, get(list).post(add))
        .route("/api/categories/{guid}", get(get_one).put(edit).delete(remove))
}

async fn list(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Vec<CategoryView>>> {
    Ok(Json(state.services.categories.list(&caller.owner, &()).await?))
}

async fn get_one(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
) -> ApiResult<Json<CategoryView>> {
    Ok(Json(state.services.categories.get(&caller.owner, guid).await?))
}

async fn add(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(cmd): ApiJson<AddCategoryCmd>,
) -> ApiResult<Response> {
    let guid = state.services.categories.add(&caller.owner, cmd).await?;
    Ok(created(COLLECTION, guid))
}

async fn edit(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
    ApiJson(cmd): ApiJson<EditCategoryCmd>,
) -> ApiResult<StatusCode> {
    state.services.categories.edit(&caller.owner, guid, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(guid): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.categories.delete(&caller.owner, guid, &()).await?;
    Ok(StatusCode::NO_CONTENT)
}
