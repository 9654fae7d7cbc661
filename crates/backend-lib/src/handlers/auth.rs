// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and logout.
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use board_common::{LoginRequest, RegisterRequest, UserProfile};
use tracing::debug;

use crate::auth::SessionState;
use crate::clock::Clock;
use crate::error::AppError;
use crate::middleware::{clear_cookie_header, session_cookie_header};
use crate::validation::validate_registration;
use crate::AppState;

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    validate_registration(&form, &state.settings.password.requirements())?;
    let profile = state.auth.register(form).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `POST /login`: verify credentials and start a fresh session
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = state.auth.login(&form.username, &form.password).await?;

    let session = SessionState::for_user(&user.username, user.role, state.clock.now());
    let token = state.sessions.seal(&session)?;
    let cookie = session_cookie_header(&state.settings.session, &token)?;

    Ok(([(SET_COOKIE, cookie)], Json(user.profile())).into_response())
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    debug!("session cookie cleared on logout");
    let cookie = clear_cookie_header(&state.settings.session)?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}
