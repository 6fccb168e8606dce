//! Error types for the Atrium core crate

use std::{error::Error as StdError, fmt};

/// Main error type for configuration, validation and local storage
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Serialization error
    Serialization(serde_json::Error),

    /// Durable storage error
    Storage {
        /// Storage key involved
        key: String,
        /// Error message
        message: String,
    },
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a storage error for the given key
    pub fn storage(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Storage { key, message } => write!(f, "Storage error ({key}): {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// From implementations for automatic conversions
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

/// Collapses a validator report into the first failing field, alphabetically
impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut failures: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .collect();
        failures.sort();

        failures.into_iter().next().map_or_else(
            || Self::validation("form", "invalid input"),
            |(field, message)| Self::Validation { field, message },
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use validator::Validate;

    #[test]
    fn test_validation_error_display() {
        let error = Error::validation("email", "Must be a valid address");

        assert_eq!(
            format!("{}", error),
            "Validation error: email - Must be a valid address"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_storage_error_display() {
        let error = Error::storage("token", "permission denied");
        assert_eq!(
            format!("{}", error),
            "Storage error (token): permission denied"
        );
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        let app_error = Error::from(json_error);

        assert!(matches!(app_error, Error::Serialization(_)));
        assert!(format!("{}", app_error).contains("Serialization error"));
        assert!(app_error.source().is_some());
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
        #[validate(email(message = "Invalid email"))]
        email: String,
    }

    #[test]
    fn test_validation_errors_pick_first_field() {
        let form = Form {
            title: String::new(),
            email: "nope".to_string(),
        };
        let error = Error::from(form.validate().unwrap_err());

        match error {
            Error::Validation { field, message } => {
                assert_eq!(field, "email");
                assert_eq!(message, "Invalid email");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_error_conversion() {
        let error = Error::from(config::ConfigError::Message("missing field".into()));

        assert!(matches!(error, Error::Configuration { .. }));
        assert_eq!(format!("{}", error), "Configuration error: missing field");
        assert!(error.source().is_none());
    }
}
