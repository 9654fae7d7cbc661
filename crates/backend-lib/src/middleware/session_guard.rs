// ============================
// crates/backend-lib/src/middleware/session_guard.rs
// ============================
//! Inactivity timeout for the client-held session.
//!
//! Runs before every handler. The session is opened from the cookie,
//! checked against the idle timeout, and either refreshed and handed to
//! the handler or cleared with a 401. A live session whose account has
//! since been deleted is dropped and the request runs unauthenticated.
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use board_common::Role;
use chrono::TimeDelta;
use metrics::counter;
use tracing::{debug, error, info};

use crate::auth::{parse_timestamp, SessionState};
use crate::clock::Clock;
use crate::config::SessionSettings;
use crate::error::AppError;
use crate::metrics::{SESSION_EXPIRED, SESSION_REJECTED};
use crate::AppState;

/// Result of checking one session
#[derive(Debug)]
pub enum GuardOutcome {
    /// Nothing to check
    Anonymous,
    /// Session is live and `last_active` now reads the current time
    Active,
    /// Session was cleared; the request must not proceed
    Expired(AppError),
}

/// Enforces the idle timeout against an injected clock
pub struct SessionGuard {
    clock: Arc<dyn Clock>,
    timeout: TimeDelta,
}

impl SessionGuard {
    pub fn new(clock: Arc<dyn Clock>, timeout: std::time::Duration) -> Self {
        Self {
            clock,
            timeout: TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Check and mutate the session in place.
    ///
    /// A missing `last_active` is a first sighting and gets stamped with
    /// the current time. An unparsable one fails closed. A timestamp in the
    /// future yields a negative gap and is not expired.
    pub fn check(&self, session: &mut SessionState) -> GuardOutcome {
        if session.is_empty() {
            return GuardOutcome::Anonymous;
        }

        let now = self.clock.now();
        let Some(raw) = session.last_active.as_deref() else {
            session.touch(now);
            return GuardOutcome::Active;
        };

        let last_active = match parse_timestamp(raw) {
            Ok(instant) => instant,
            Err(err) => {
                session.clear();
                return GuardOutcome::Expired(err);
            },
        };

        if now.signed_duration_since(last_active) > self.timeout {
            session.clear();
            return GuardOutcome::Expired(AppError::SessionExpired);
        }

        session.touch(now);
        GuardOutcome::Active
    }
}

/// Session guard middleware
pub async fn session_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_settings = &state.settings.session;

    let Some(token) = session_cookie(request.headers(), &cookie_settings.cookie_name) else {
        return next.run(request).await;
    };

    let Some(mut session) = state.sessions.open(&token) else {
        // Tampered, truncated or sealed under another key
        counter!(SESSION_REJECTED).increment(1);
        debug!("ignoring undecodable session cookie");
        return run_without_session(request, next, cookie_settings).await;
    };

    let username = session.username.clone();
    match state.guard.check(&mut session) {
        GuardOutcome::Anonymous => next.run(request).await,
        GuardOutcome::Expired(err) => {
            counter!(SESSION_EXPIRED).increment(1);
            info!(username = ?username, reason = %err, "session cleared");
            let clears = err.clears_session();
            let mut response = err.into_response();
            if clears {
                attach_cookie(&mut response, clear_cookie_header(cookie_settings));
            }
            response
        },
        GuardOutcome::Active => {
            if let Some(name) = session.username.as_deref() {
                match state.users.find_user(name).await {
                    Ok(Some(_)) => {},
                    // Account removed while the cookie was still live
                    Ok(None) => {
                        counter!(SESSION_REJECTED).increment(1);
                        info!(username = %name, "session names a removed account");
                        return run_without_session(request, next, cookie_settings).await;
                    },
                    Err(err) => return err.into_response(),
                }
            }

            let refreshed = match state.sessions.seal(&session) {
                Ok(token) => token,
                Err(err) => return err.into_response(),
            };
            request.extensions_mut().insert(session);

            let mut response = next.run(request).await;
            // Login and logout write their own cookie
            attach_cookie(
                &mut response,
                session_cookie_header(cookie_settings, &refreshed),
            );
            response
        },
    }
}

/// Run the handler unauthenticated and tell the client to drop its cookie
async fn run_without_session(
    request: Request,
    next: Next,
    cookie_settings: &SessionSettings,
) -> Response {
    let mut response = next.run(request).await;
    attach_cookie(&mut response, clear_cookie_header(cookie_settings));
    response
}

fn attach_cookie(response: &mut Response, cookie: Result<HeaderValue, AppError>) {
    if response.headers().contains_key(SET_COOKIE) {
        return;
    }
    match cookie {
        Ok(value) => {
            response.headers_mut().insert(SET_COOKIE, value);
        },
        Err(err) => error!(error = %err, "failed to write session cookie"),
    }
}

/// Value of the named cookie, if present and non-empty
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// `Set-Cookie` value carrying a sealed session token
pub fn session_cookie_header(
    settings: &SessionSettings,
    token: &str,
) -> Result<HeaderValue, AppError> {
    cookie_header(settings, token, false)
}

/// `Set-Cookie` value that makes the client drop the session
pub fn clear_cookie_header(settings: &SessionSettings) -> Result<HeaderValue, AppError> {
    cookie_header(settings, "", true)
}

fn cookie_header(
    settings: &SessionSettings,
    value: &str,
    expire: bool,
) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        settings.cookie_name, value
    );
    if expire {
        cookie.push_str("; Max-Age=0");
    }
    if settings.secure_cookie {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}

/// The logged-in caller, as validated by [`session_guard`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionState>()
            .ok_or(AppError::Unauthenticated)?;
        let username = session.username.clone().ok_or(AppError::Unauthenticated)?;
        Ok(CurrentUser {
            username,
            role: session.role.unwrap_or_default(),
        })
    }
}
