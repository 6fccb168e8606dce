//! Common test utilities and fixtures for integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use atrium_client::{Dashboard, SessionSlots, SessionStore};
use atrium_core::{Config, Profile, Role, Session};
use serde_json::{Value, json};
use std::sync::Once;
use wiremock::MockServer;

static LOGGING: Once = Once::new();

/// Install a test subscriber once; `RUST_LOG` controls verbosity
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber_init();
    });
}

fn tracing_subscriber_init() -> atrium_core::Result<()> {
    let logging = atrium_core::LoggingConfig {
        level: "warn".to_string(),
        format: "pretty".to_string(),
    };
    atrium_core::init_logging(&logging)
}

/// Configuration pointing at a mock backend
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    config.api.timeout_secs = 5;
    config
}

/// Dashboard over in-memory slots, already hydrated as logged out
pub fn dashboard(server: &MockServer) -> Dashboard {
    dashboard_with_slots(server, SessionSlots::in_memory())
}

/// Dashboard over the given slots, hydrated from them
pub fn dashboard_with_slots(server: &MockServer, slots: SessionSlots) -> Dashboard {
    init_test_logging();
    let session = SessionStore::new(slots);
    session.hydrate();
    Dashboard::with_session(config_for(server), session).unwrap()
}

/// Profile of the logged-in admin used across tests
pub fn admin_profile() -> Profile {
    Profile {
        id: "admin-1".to_string(),
        name: "Ada Admin".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::Admin,
        permissions: ["events:write".to_string()].into_iter().collect(),
        is_active: true,
        ..Profile::default()
    }
}

/// A ready-made session for `admin_profile`
pub fn admin_session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        user: admin_profile(),
    }
}

/// Backend JSON for `admin_profile`
pub fn admin_json() -> Value {
    json!({
        "_id": "admin-1",
        "name": "Ada Admin",
        "email": "ada@example.com",
        "role": "admin",
        "permissions": ["events:write"],
        "isActive": true
    })
}

/// Backend JSON for an event
pub fn event_json(id: &str, title: &str, deleted: bool) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": "",
        "status": "published",
        "registeredCount": 3,
        "isDeleted": deleted,
        "createdAt": "2024-03-01T10:00:00Z"
    })
}
