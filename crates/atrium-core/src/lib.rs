//! Core types and utilities for the Atrium admin client
//!
//! Everything in this crate is transport-agnostic: domain records, the
//! configuration tree, slug/text helpers and the derived list views that
//! every admin screen renders from.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use types::{Blog, Event, ManagedUser, Profile, Role, Session};
pub use view::{ListQuery, ListState, Listable, PageView, SortKey};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to
/// stderr, as JSON when `logging.format` is `"json"` and pretty text
/// otherwise.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if logging.format.eq_ignore_ascii_case("json") {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| Error::Configuration {
        message: format!("Failed to initialize logging: {e}"),
    })
}
