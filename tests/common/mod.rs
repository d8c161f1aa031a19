// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use third_spaces::config::Config;
use third_spaces::db::{FirestoreDb, MemoryDb, Repository};
use third_spaces::middleware::auth::create_jwt;
use third_spaces::models::User;
use third_spaces::routes::create_router;
use third_spaces::AppState;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let db: Arc<dyn Repository> = Arc::new(MemoryDb::new());
    let state = Arc::new(AppState::new(Config::test_default(), db));
    (create_router(state.clone()), state)
}

/// Insert a verified user directly and return its id and a session token.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, name: &str) -> (String, String) {
    seed_user_with(state, name, |_| {}).await
}

#[allow(dead_code)]
pub async fn seed_admin(state: &AppState, name: &str) -> (String, String) {
    seed_user_with(state, name, |u| u.is_admin = true).await
}

#[allow(dead_code)]
pub async fn seed_user_with(
    state: &AppState,
    name: &str,
    customize: impl FnOnce(&mut User),
) -> (String, String) {
    let mut user = User::new(
        state.db.new_id(),
        name.to_string(),
        "Tester".to_string(),
        name.to_lowercase(),
        format!("{}@example.com", name.to_lowercase()),
        "not-a-real-hash".to_string(),
    );
    user.is_verified = true;
    customize(&mut user);

    assert!(state.db.create_user(&user).await.unwrap());
    let token = create_jwt(&user, &state.config.jwt_signing_key).unwrap();
    (user.id, token)
}

/// Send a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// A valid event creation payload.
#[allow(dead_code)]
pub fn event_body(limit: Option<u32>) -> Value {
    serde_json::json!({
        "title": "Picnic in the park",
        "description": "Bring a blanket",
        "type": "Social",
        "address": "Rengstorff Park",
        "time": "2030-06-01T18:00:00Z",
        "location": { "lat": 37.40, "lng": -122.09 },
        "participantsLimit": limit,
    })
}
