//! Integration tests for login, token injection and session expiry

#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::unreachable
)]

mod common;

use atrium_client::{ClientError, SessionEvent, SessionSlots, SessionStatus};
use atrium_core::types::LoginRequest;
use atrium_core::view::DeletedFilter;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> LoginRequest {
    LoginRequest {
        email: "ada@example.com".to_string(),
        password: "correct horse".to_string(),
    }
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "correct horse"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": token, "user": admin_json()})),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_persists_token_and_next_request_carries_it() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-1").await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json("e1", "Launch", false)])))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard_with_slots(&server, SessionSlots::on_disk(dir.path()));
    let mut events = dashboard.subscribe();

    let profile = dashboard.auth.login(&credentials()).await.unwrap();
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
    assert!(dir.path().join("token.json").exists());

    let listed = dashboard.events.list(DeletedFilter::Hide).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server, "tok-keep").await;

    let first = dashboard_with_slots(&server, SessionSlots::on_disk(dir.path()));
    first.auth.login(&credentials()).await.unwrap();
    drop(first);

    let second = dashboard_with_slots(&server, SessionSlots::on_disk(dir.path()));
    assert_eq!(second.status(), SessionStatus::Authenticated);
    assert_eq!(second.session.token().as_deref(), Some("tok-keep"));
    assert_eq!(second.session.profile().unwrap().role, atrium_core::Role::Admin);
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_announces_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.session.set_session(admin_session("tok-old")).unwrap();
    let mut events = dashboard.subscribe();

    let (first, second) = tokio::join!(
        dashboard.events.list(DeletedFilter::Hide),
        dashboard.events.list(DeletedFilter::Hide),
    );

    for result in [first, second] {
        match result {
            Err(ClientError::Unauthenticated { message }) => assert_eq!(message, "Token expired"),
            other => unreachable!("expected 401, got {other:?}"),
        }
    }
    assert_eq!(dashboard.status(), SessionStatus::Anonymous);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_bad_credentials_do_not_expire_anything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.session.set_session(admin_session("tok-current")).unwrap();
    let mut events = dashboard.subscribe();

    let err = dashboard.auth.login(&credentials()).await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(err.user_message(), "Invalid email or password");

    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(dashboard.session.token().as_deref(), Some("tok-current"));

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_forbidden_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/users/hard/u9"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Superadmins only"})))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.session.set_session(admin_session("tok-admin")).unwrap();
    let mut events = dashboard.subscribe();

    let err = dashboard.users.hard_delete("u9").await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden { .. }));
    assert!(!err.is_auth_failure());
    assert_eq!(dashboard.status(), SessionStatus::Authenticated);
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_no_stale_bearer_after_clear() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.session.set_session(admin_session("tok-gone")).unwrap();
    dashboard.session.clear_session().unwrap();

    dashboard.blogs.list(DeletedFilter::Hide).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_verify_refreshes_profile() {
    let server = MockServer::start().await;
    let mut refreshed = admin_json();
    refreshed["name"] = json!("Ada Lovelace");
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .and(header("Authorization", "Bearer tok-v"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": refreshed})))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.session.set_session(admin_session("tok-v")).unwrap();

    let profile = dashboard.auth.verify().await.unwrap();
    assert_eq!(profile.name, "Ada Lovelace");
    assert_eq!(dashboard.session.profile().unwrap().name, "Ada Lovelace");
}

#[tokio::test]
async fn test_verify_without_session_sends_nothing() {
    let server = MockServer::start().await;
    let dashboard = dashboard(&server);

    let err = dashboard.auth.verify().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected_locally() {
    let server = MockServer::start().await;
    let dashboard = dashboard(&server);

    let err = dashboard
        .auth
        .login(&LoginRequest {
            email: "not-an-email".to_string(),
            password: "x".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation { ref field, .. } if field == "email"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_clears_disk_and_announces() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dashboard = dashboard_with_slots(&server, SessionSlots::on_disk(dir.path()));
    dashboard.session.set_session(admin_session("tok-bye")).unwrap();
    let mut events = dashboard.subscribe();

    dashboard.auth.logout().unwrap();

    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    assert!(!dir.path().join("token.json").exists());
    assert!(!dir.path().join("user.json").exists());
}
