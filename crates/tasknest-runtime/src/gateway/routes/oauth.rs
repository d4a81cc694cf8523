use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::gateway::extract::Caller;
use crate::gateway::server::AppState;

const ADMIN_ROLE: &str = "admin";

/// The principal a request acts as.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub username: String,
    pub display_name: Option<String>,
    pub is_authenticated: bool,
    pub is_guest: bool,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/oauth/me", get(me))
}

async fn me(caller: Caller) -> Json<Principal> {
    Json(Principal {
        username: caller.owner.name().to_string(),
        display_name: caller
            .auth
            .claim("name")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        is_authenticated: caller.auth.is_authenticated(),
        is_guest: caller.owner.is_guest(),
        roles: caller.auth.roles().to_vec(),
        is_admin: caller.auth.has_role(ADMIN_ROLE),
    })
}
