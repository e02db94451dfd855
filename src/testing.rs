//! Router-level helpers shared by the handler tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::mailer::{testing::RecordingMailer, Mailer},
    config::AppConfig,
    state::AppState,
    store::memory::MemoryUserStore,
};

pub fn app() -> (Router, AppState, Arc<MemoryUserStore>, Arc<RecordingMailer>) {
    app_configured(|_| {})
}

pub fn app_configured(
    tweak: impl FnOnce(&mut AppConfig),
) -> (Router, AppState, Arc<MemoryUserStore>, Arc<RecordingMailer>) {
    let store = Arc::new(MemoryUserStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let mut config = AppState::test_config();
    tweak(&mut config);
    let state = AppState::from_parts(store.clone(), config, mailer.clone());
    (build_app(state.clone()), state, store, mailer)
}

pub fn app_with(mailer: Arc<dyn Mailer>) -> (Router, AppState, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::from_parts(store.clone(), AppState::test_config(), mailer);
    (build_app(state.clone()), state, store)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn call(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

/// Registers a plain user and returns the issued token.
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, _, body) = call(
        app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"name": name, "email": email, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register {email}: {body}");
    body["token"].as_str().unwrap().to_string()
}
