//! Error types for the API client

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Message shown when the server gives no usable explanation
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors returned by the session store, HTTP client and resource clients
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected before any request was sent
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: String,
        /// Human readable reason
        message: String,
    },

    /// The backend answered 401
    #[error("Authentication required: {message}")]
    Unauthenticated {
        /// Server message or a generic one
        message: String,
    },

    /// The backend answered 403; the session stays valid
    #[error("Permission denied: {message}")]
    Forbidden {
        /// Server message or a generic one
        message: String,
    },

    /// The backend answered 404
    #[error("Not found: {message}")]
    NotFound {
        /// Server message or a generic one
        message: String,
    },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server message or a generic one
        message: String,
    },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local configuration or storage failure
    #[error(transparent)]
    Core(atrium_core::Error),
}

impl ClientError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Text suitable for a user-facing notice
    ///
    /// Server-provided messages are returned verbatim; transport and
    /// decoding failures collapse into a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Unauthenticated { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Api { message, .. } => message.clone(),
            Self::Network(err) if err.is_timeout() => {
                "The server took too long to respond.".to_string()
            }
            Self::Network(_) => "Could not reach the server.".to_string(),
            Self::Decode(_) => GENERIC_FAILURE.to_string(),
            Self::Core(err) => err.to_string(),
        }
    }

    /// Whether this failure means the session is no longer valid
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// HTTP status behind this error, if the backend answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<atrium_core::Error> for ClientError {
    fn from(err: atrium_core::Error) -> Self {
        match err {
            atrium_core::Error::Validation { field, message } => {
                Self::Validation { field, message }
            }
            other => Self::Core(other),
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        atrium_core::Error::from(errors).into()
    }
}
