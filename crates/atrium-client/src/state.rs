//! Composition root shared by front ends

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::resources::auth::AuthClient;
use crate::resources::blogs::BlogsClient;
use crate::resources::events::EventsClient;
use crate::resources::permissions::PermissionsClient;
use crate::resources::users::UsersClient;
use crate::session::{SessionEvent, SessionStatus, SessionStore};
use crate::storage::SessionSlots;
use atrium_core::Config;
use atrium_core::view::ListState;
use atrium_core::Listable;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Every client wired to one session store
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Shared session
    pub session: SessionStore,
    /// Authentication endpoints
    pub auth: AuthClient,
    /// Event endpoints
    pub events: EventsClient,
    /// Blog endpoints
    pub blogs: BlogsClient,
    /// User administration endpoints
    pub users: UsersClient,
    /// Permission endpoints
    pub permissions: PermissionsClient,
}

impl Dashboard {
    /// Build clients from configuration and restore the persisted session
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> ClientResult<Self> {
        let slots = SessionSlots::from_config(&config.session);
        let session = SessionStore::new(slots);
        let status = session.hydrate();
        debug!(?status, base_url = %config.api.base_url, "Dashboard initialized");
        Self::with_session(config, session)
    }

    /// Build clients around an existing session store
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_session(config: Config, session: SessionStore) -> ClientResult<Self> {
        let http = HttpClient::new(&config.api, session.clone())?;
        Ok(Self {
            config: Arc::new(config),
            session,
            auth: AuthClient::new(http.clone()),
            events: EventsClient::new(http.clone()),
            blogs: BlogsClient::new(http.clone()),
            users: UsersClient::new(http.clone()),
            permissions: PermissionsClient::new(http),
        })
    }

    /// Current session status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Receive session events, including expiry
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Empty list state sized by the configured page size
    #[must_use]
    pub fn list_state<T: Listable>(&self) -> ListState<T> {
        ListState::new(self.config.view.page_size)
    }
}
