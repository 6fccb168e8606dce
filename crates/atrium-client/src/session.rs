//! Session store: the bearer token and profile shared by every request
//!
//! The store is constructed explicitly and handed to the HTTP client. State
//! changes are broadcast as [`SessionEvent`]s so a front end can react to
//! an expired session without the HTTP layer knowing about navigation.

use crate::error::ClientResult;
use crate::storage::SessionSlots;
use atrium_core::{Profile, Session};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_CAPACITY: usize = 16;

/// What is known about the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Persisted state has not been restored yet
    Unknown,
    /// Known to be logged out
    Anonymous,
    /// A token and profile are held
    Authenticated,
}

/// Session transitions observable by subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login or signup stored a new session
    LoggedIn,
    /// The user logged out
    LoggedOut,
    /// The backend rejected the token; the session has been cleared
    Expired,
}

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    hydrated: bool,
}

/// Shared, persisted authentication state
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<RwLock<State>>,
    slots: SessionSlots,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Store persisting to `slots`; call [`hydrate`](Self::hydrate) to restore
    #[must_use]
    pub fn new(slots: SessionSlots) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(State::default())),
            slots,
            events,
        }
    }

    /// Store with both slots in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(SessionSlots::in_memory())
    }

    /// Restore the persisted session
    ///
    /// Unreadable storage is logged and treated as logged out.
    pub fn hydrate(&self) -> SessionStatus {
        let restored = match self.slots.load() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Could not read persisted session");
                None
            }
        };

        let mut state = self.state.write();
        if let Some(session) = &restored {
            info!(user = %session.user.email, "Restored persisted session");
        }
        state.session = restored;
        state.hydrated = true;
        Self::status_of(&state)
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        Self::status_of(&self.state.read())
    }

    fn status_of(state: &State) -> SessionStatus {
        match (&state.session, state.hydrated) {
            (Some(_), _) => SessionStatus::Authenticated,
            (None, true) => SessionStatus::Anonymous,
            (None, false) => SessionStatus::Unknown,
        }
    }

    /// Whether a session is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().session.is_some()
    }

    /// Bearer token, if any
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.read().session.as_ref().map(|s| s.token.clone())
    }

    /// Cached profile, if any
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.state.read().session.as_ref().map(|s| s.user.clone())
    }

    /// Token and profile together
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    /// Store a new session and persist it to both slots
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted; the in-memory
    /// session is left unchanged in that case.
    pub fn set_session(&self, session: Session) -> ClientResult<()> {
        self.slots.save(&session)?;
        info!(user = %session.user.email, role = %session.user.role, "Logged in");
        {
            let mut state = self.state.write();
            state.session = Some(session);
            state.hydrated = true;
        }
        self.publish(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Forget the session in memory and in both slots
    ///
    /// # Errors
    ///
    /// Returns an error if a slot could not be cleared; memory is cleared
    /// regardless.
    pub fn clear_session(&self) -> ClientResult<()> {
        self.take();
        self.slots.clear()?;
        Ok(())
    }

    /// Clear the session and announce [`SessionEvent::LoggedOut`]
    ///
    /// # Errors
    ///
    /// Returns an error if a slot could not be cleared.
    pub fn logout(&self) -> ClientResult<()> {
        let previous = self.take();
        let cleared = self.slots.clear();
        if let Some(session) = previous {
            info!(user = %session.user.email, "Logged out");
            self.publish(SessionEvent::LoggedOut);
        }
        cleared?;
        Ok(())
    }

    /// Replace the cached profile, keeping the token
    ///
    /// Returns `false` when there is no session to update.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be persisted; the cached
    /// profile is left unchanged in that case.
    pub fn update_profile(&self, profile: Profile) -> ClientResult<bool> {
        let mut state = self.state.write();
        let Some(session) = state.session.as_mut() else {
            return Ok(false);
        };
        self.slots.save_profile(&profile)?;
        session.user = profile;
        Ok(true)
    }

    /// Clear the session because the backend rejected `token`
    ///
    /// Only the session that issued the rejected request is cleared, so
    /// several concurrent rejections produce a single
    /// [`SessionEvent::Expired`]. Returns whether this call cleared it.
    pub fn expire(&self, token: &str) -> bool {
        let expired = {
            let mut state = self.state.write();
            let current = state.session.as_ref().is_some_and(|s| s.token == token);
            if current { state.session.take() } else { None }
        };

        let Some(session) = expired else {
            return false;
        };

        warn!(user = %session.user.email, "Session rejected by the server, logging out");
        if let Err(err) = self.slots.clear() {
            warn!(error = %err, "Failed to clear persisted session after expiry");
        }
        self.publish(SessionEvent::Expired);
        true
    }

    /// Receive future session events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn take(&self) -> Option<Session> {
        let mut state = self.state.write();
        state.hydrated = true;
        state.session.take()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
