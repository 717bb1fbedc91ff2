//! Session transitions and background refresh against a mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use icycon_client::{
    CredentialStore, FileStorage, MemoryStorage, Session, SessionStatus, Storage,
};
use icycon_core::{Identifier, ProfileUpdate};
use icycon_integration_tests::{Method, MockBackend, MockResponse};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

fn login_body() -> Value {
    json!({
        "user": {"id": 1, "email": "a@b.com", "username": "ab"},
        "features": [],
    })
}

fn fresh_profile() -> Value {
    json!({"id": 1, "email": "a@b.com", "username": "ab", "plan": "pro"})
}

fn features_body() -> Value {
    json!({"features": [
        {"key": "seo", "name": "SEO", "description": "Keyword research", "endpoint": "/api/seo/"}
    ]})
}

fn script_happy_path(backend: &MockBackend) {
    backend.respond(
        Method::POST,
        "/api/auth/login",
        MockResponse::json(200, &login_body()),
    );
    backend.respond(
        Method::GET,
        "/api/features/",
        MockResponse::json(200, &features_body()),
    );
    backend.respond(
        Method::GET,
        "/api/profile/dashboard",
        MockResponse::json(200, &fresh_profile()),
    );
}

fn session_over(backend: &MockBackend, storage: Arc<dyn Storage>) -> Session {
    let store = Arc::new(CredentialStore::new(storage));
    Session::new(backend.client(store).unwrap())
}

async fn login(session: &Session) {
    session
        .login(
            Identifier::parse("a@b.com").unwrap(),
            SecretString::from("pw"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_persists_then_refreshes() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    login(&session).await;

    // Persisted with the login snapshot before the refresh lands.
    let stored = session.client().credentials().load().unwrap();
    assert_eq!(stored.credentials.identifier.as_str(), "a@b.com");
    assert_eq!(session.status(), SessionStatus::Authenticated);

    session.wait_for_refresh().await;

    let features = session.features().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].key, "seo");
    assert_eq!(session.user().unwrap().plan.as_deref(), Some("pro"));

    let stored = session.client().credentials().load().unwrap();
    assert_eq!(stored.cached_profile.unwrap().plan.as_deref(), Some("pro"));

    for path in ["/api/features/", "/api/profile/dashboard"] {
        let request = &backend.requests_to(path)[0];
        assert_eq!(request.header("authorization"), Some("Basic YUBiLmNvbTpwdw=="));
    }
}

#[tokio::test]
async fn test_failed_login_leaves_session_anonymous() {
    let backend = MockBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/api/auth/login",
        MockResponse::json(400, &json!({"detail": "Invalid email or password."})),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    let err = session
        .login(
            Identifier::parse("a@b.com").unwrap(),
            SecretString::from("wrong"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password.");
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.client().credentials().load().is_none());
}

#[tokio::test]
async fn test_signup_fetches_profile_in_background() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    backend.respond(
        Method::POST,
        "/api/auth/signup",
        MockResponse::json(201, &json!({"email": "a@b.com", "username": "ab", "features": []})),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    let response = session
        .signup(
            Identifier::parse("a@b.com").unwrap(),
            "ab",
            SecretString::from("pw"),
        )
        .await
        .unwrap();

    assert_eq!(response.username, "ab");
    assert!(session.is_authenticated());
    let signup = &backend.requests_to("/api/auth/signup")[0];
    assert_eq!(signup.json().unwrap()["password_confirm"], "pw");
    assert!(signup.header("authorization").is_none());

    session.wait_for_refresh().await;
    assert_eq!(session.user().unwrap().username, "ab");
}

#[tokio::test]
async fn test_logout_clears_state_and_stops_auth() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));
    login(&session).await;
    session.wait_for_refresh().await;

    session.logout();

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.user().is_none());
    assert!(session.features().is_none());
    assert!(session.client().credentials().load().is_none());

    backend.clear_requests();
    session.client().fetch_features().await.unwrap();
    assert!(backend.requests()[0].header("authorization").is_none());
}

#[tokio::test]
async fn test_refresh_failure_keeps_session() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    backend.respond(
        Method::GET,
        "/api/features/",
        MockResponse::json(500, &json!({"detail": "boom"})),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    login(&session).await;
    session.wait_for_refresh().await;

    assert!(session.is_authenticated());
    assert!(session.features().is_none());
    // Profile fetch still ran after the features failure.
    assert_eq!(session.user().unwrap().plan.as_deref(), Some("pro"));
    assert!(session.client().credentials().load().is_some());
}

#[tokio::test]
async fn test_unauthorized_refresh_does_not_log_out() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    backend.respond(
        Method::GET,
        "/api/profile/dashboard",
        MockResponse::json(401, &json!({"detail": "Invalid username/password."})),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    login(&session).await;
    session.wait_for_refresh().await;

    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().username, "ab");
}

#[tokio::test]
async fn test_late_refresh_cannot_repopulate_after_logout() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    backend.respond(
        Method::GET,
        "/api/features/",
        MockResponse::json(200, &features_body()).delayed(Duration::from_millis(200)),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    login(&session).await;
    session.logout();
    tokio::time::sleep(Duration::from_millis(400)).await;
    session.wait_for_refresh().await;

    assert!(session.features().is_none());
    assert!(session.user().is_none());
    assert!(session.client().credentials().load().is_none());
}

#[tokio::test]
async fn test_update_profile_is_persisted() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));
    login(&session).await;
    session.wait_for_refresh().await;

    backend.respond(
        Method::PATCH,
        "/api/profile/dashboard",
        MockResponse::json(
            200,
            &json!({"id": 1, "email": "a@b.com", "username": "ab", "region": "EU"}),
        ),
    );
    let update = ProfileUpdate {
        region: Some("EU".to_string()),
        ..ProfileUpdate::default()
    };
    let profile = session.update_profile(&update).await.unwrap();

    assert_eq!(profile.region.as_deref(), Some("EU"));
    assert_eq!(session.user(), Some(profile.clone()));
    let stored = session.client().credentials().load().unwrap();
    assert_eq!(stored.cached_profile, Some(profile));
}

#[tokio::test]
async fn test_slow_refresh_does_not_overwrite_profile_edit() {
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);
    backend.respond(
        Method::GET,
        "/api/profile/dashboard",
        MockResponse::json(
            200,
            &json!({"id": 1, "email": "a@b.com", "username": "ab", "region": "OLD"}),
        )
        .delayed(Duration::from_millis(300)),
    );
    backend.respond(
        Method::PATCH,
        "/api/profile/dashboard",
        MockResponse::json(
            200,
            &json!({"id": 1, "email": "a@b.com", "username": "ab", "region": "EU"}),
        ),
    );
    let session = session_over(&backend, Arc::new(MemoryStorage::new()));

    login(&session).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let update = ProfileUpdate {
        region: Some("EU".to_string()),
        ..ProfileUpdate::default()
    };
    session.update_profile(&update).await.unwrap();
    session.wait_for_refresh().await;

    assert_eq!(session.user().unwrap().region.as_deref(), Some("EU"));
    let stored = session.client().credentials().load().unwrap();
    assert_eq!(stored.cached_profile.unwrap().region.as_deref(), Some("EU"));
    assert_eq!(session.features().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_restored_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::start().await.unwrap();
    script_happy_path(&backend);

    {
        let session = session_over(&backend, Arc::new(FileStorage::new(dir.path())));
        login(&session).await;
        session.wait_for_refresh().await;
    }

    let restored = session_over(&backend, Arc::new(FileStorage::new(dir.path())));
    assert!(restored.is_authenticated());
    assert_eq!(
        restored.auth_header().unwrap().expose_secret(),
        "Basic YUBiLmNvbTpwdw=="
    );
    // Cached profile is visible before the restore-time refresh finishes.
    assert_eq!(restored.user().unwrap().plan.as_deref(), Some("pro"));

    restored.wait_for_refresh().await;
    assert_eq!(restored.features().unwrap().len(), 1);
}
