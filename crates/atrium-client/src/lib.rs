//! REST client for the Atrium events, blog and user administration API
//!
//! A [`SessionStore`] holds the bearer token and profile and persists them
//! to [`storage`] slots. The [`HttpClient`] attaches the token to every
//! request and expires the session when the backend answers 401. The
//! [`resources`] clients map each domain operation onto one HTTP call.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod error;
pub mod form;
pub mod http;
pub mod resources;
pub mod session;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use error::{ClientError, ClientResult};
pub use form::{FieldValue, FilePart, FormField, MultipartBody};
pub use http::{AuthScope, HttpClient};
pub use resources::auth::AuthClient;
pub use resources::blogs::{BlogForm, BlogsClient};
pub use resources::events::{EventForm, EventsClient};
pub use resources::permissions::PermissionsClient;
pub use resources::users::UsersClient;
pub use resources::{BulkFailure, BulkReport, DeleteMode};
pub use session::{SessionEvent, SessionStatus, SessionStore};
pub use state::Dashboard;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SessionSlots};
