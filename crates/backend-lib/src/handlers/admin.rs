// ============================
// crates/backend-lib/src/handlers/admin.rs
// ============================
//! Admin routes. The actor's role is always re-read from the store.
use axum::{
    extract::{Path, State},
    Json,
};
use board_common::{AdminActionResponse, UserProfile};
use tracing::warn;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// `GET {admin}/users`
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let actor = state.admin.resolve_actor(&user.username).await?;
    if !actor.is_admin() {
        warn!(actor = %actor.username, "user listing refused");
        return Err(AppError::Unauthorized);
    }
    Ok(Json(state.admin.list().await?))
}

/// `POST {admin}/users/{username}/promote`
pub async fn promote_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let actor = state.admin.resolve_actor(&user.username).await?;
    state.admin.promote(&actor, &username).await?;
    Ok(done(username))
}

/// `POST {admin}/users/{username}/demote`
pub async fn demote_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let actor = state.admin.resolve_actor(&user.username).await?;
    state.admin.demote(&actor, &username).await?;
    Ok(done(username))
}

/// `DELETE {admin}/users/{username}`
pub async fn remove_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let actor = state.admin.resolve_actor(&user.username).await?;
    state.admin.remove(&actor, &username).await?;
    Ok(done(username))
}

fn done(username: String) -> Json<AdminActionResponse> {
    Json(AdminActionResponse {
        success: true,
        username,
    })
}
