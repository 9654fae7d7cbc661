// ============================
// crates/backend-lib/src/router.rs
// ============================
//! Route table.
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, admin, auth, board};
use crate::middleware::session_guard;
use crate::AppState;

/// Build the application router.
///
/// The session guard wraps every route, so a stale session is refused
/// before any handler runs.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/messages", get(board::list_messages).post(board::post_message))
        .nest(&admin_prefix(&state), admin_routes())
        .layer(from_fn_with_state(state.clone(), session_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{username}", delete(admin::remove_user))
        .route("/users/{username}/promote", post(admin::promote_user))
        .route("/users/{username}/demote", post(admin::demote_user))
}

/// `/admin`, or `/admin/<secret>` when a path secret is configured
pub fn admin_prefix(state: &AppState) -> String {
    match &state.settings.admin.path_secret {
        Some(secret) => format!("/admin/{secret}"),
        None => "/admin".to_string(),
    }
}
