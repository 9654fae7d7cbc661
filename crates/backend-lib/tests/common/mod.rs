//! Shared harness for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use backend_lib::{
    admin::bootstrap_admin,
    clock::ManualClock,
    config::{PasswordSettings, Settings},
    create_router, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
}

pub fn settings() -> Settings {
    Settings {
        secret_key: Some("integration-test-secret".to_string()),
        password: PasswordSettings {
            hash_cost: 4,
            ..PasswordSettings::default()
        },
        ..Settings::default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(settings()).await
    }

    /// In-memory app with the configured admin already bootstrapped
    pub async fn with_settings(settings: Settings) -> Self {
        let clock = ManualClock::at_epoch();
        let state = AppState::in_memory(settings, Arc::new(clock.clone())).unwrap();
        bootstrap_admin(state.users.as_ref(), &state.auth, &state.settings.admin)
            .await
            .unwrap();
        Self {
            router: create_router(state.clone()),
            state,
            clock,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = cookie {
            builder = builder.header(COOKIE, format!("board_session={token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn register(&self, username: &str, password: &str) -> Response {
        let body = serde_json::json!({
            "username": username,
            "password": password,
            "email": format!("{username}@example.com"),
            "phone": "5550100200",
        });
        self.send(Method::POST, "/register", Some(body), None).await
    }

    /// Log in and return the session token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self.send(Method::POST, "/login", Some(body), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        cookie_token(&response).expect("login sets a session cookie")
    }
}

/// Token carried by the response's `Set-Cookie`, `None` if absent or cleared
pub fn cookie_token(response: &Response) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let (pair, _) = header.split_once(';')?;
    let (_, value) = pair.split_once('=')?;
    (!value.is_empty()).then(|| value.to_string())
}

pub fn clears_cookie(response: &Response) -> bool {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("Max-Age=0"))
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
