//! Resource clients: one domain operation, one HTTP call
//!
//! Events, blog posts and users share the same soft-delete lifecycle, so
//! the list/get/delete plumbing lives in [`Collection`] and each resource
//! client adds its own create/update payloads on top.

pub mod auth;
pub mod blogs;
pub mod events;
pub mod permissions;
pub mod users;

use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use atrium_core::types::RecordId;
use atrium_core::view::DeletedFilter;
use futures::future::join_all;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Which lifecycle change a delete-style call makes
///
/// Each mode maps to exactly one method and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Hide the record; reversible
    Soft,
    /// Undo a soft delete
    Restore,
    /// Remove the record permanently
    Hard,
}

impl DeleteMode {
    /// HTTP method for this mode
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Soft | Self::Hard => Method::DELETE,
            Self::Restore => Method::PATCH,
        }
    }

    /// Path of this mode's endpoint under `base`
    #[must_use]
    pub fn path(self, base: &str, id: &str) -> String {
        let segment = match self {
            Self::Soft => "soft",
            Self::Restore => "restore",
            Self::Hard => "hard",
        };
        format!("{base}/{segment}/{id}")
    }

    /// Soft-delete marker a record carries after this change, if it survives
    #[must_use]
    pub const fn resulting_deleted_flag(self) -> Option<bool> {
        match self {
            Self::Soft => Some(true),
            Self::Restore => Some(false),
            Self::Hard => None,
        }
    }
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => write!(f, "soft delete"),
            Self::Restore => write!(f, "restore"),
            Self::Hard => write!(f, "permanent delete"),
        }
    }
}

/// One failed item of a bulk operation
#[derive(Debug)]
pub struct BulkFailure {
    /// Record the call was for
    pub id: RecordId,
    /// Why it failed
    pub error: ClientError,
}

/// Per-item outcome of a bulk operation
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Records the backend accepted, in request order
    pub succeeded: Vec<RecordId>,
    /// Records the backend rejected, in request order
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    /// Whether every item succeeded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of items attempted
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether any failure was a rejected session
    #[must_use]
    pub fn has_auth_failure(&self) -> bool {
        self.failed.iter().any(|f| f.error.is_auth_failure())
    }
}

impl fmt::Display for BulkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} succeeded", self.succeeded.len(), self.attempted())?;
        for failure in &self.failed {
            write!(f, "\n  {}: {}", failure.id, failure.error.user_message())?;
        }
        Ok(())
    }
}

/// Reject ids that would change the request path
pub(crate) fn check_id(id: &str) -> ClientResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::validation("id", "Record id is required"));
    }
    let dot_segment = id.chars().all(|c| c == '.');
    if dot_segment
        || id.contains(['/', '\\', '?', '#', '%'])
        || id.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ClientError::validation("id", format!("Invalid record id '{id}'")));
    }
    Ok(id)
}

/// List/get/delete plumbing for a soft-deletable collection
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    http: HttpClient,
    base: &'static str,
}

impl Collection {
    pub(crate) const fn new(http: HttpClient, base: &'static str) -> Self {
        Self { http, base }
    }

    pub(crate) const fn http(&self) -> &HttpClient {
        &self.http
    }

    pub(crate) fn item_path(&self, id: &str) -> ClientResult<String> {
        Ok(format!("{}/{}", self.base, check_id(id)?))
    }

    pub(crate) async fn list<T: DeserializeOwned>(&self, deleted: DeletedFilter) -> ClientResult<Vec<T>> {
        let query: &[(&str, &str)] = if deleted.needs_deleted() {
            &[("showDeleted", "true")]
        } else {
            &[]
        };
        let records: Vec<T> = self.http.get(self.base, query).await?;
        debug!(collection = self.base, count = records.len(), "Fetched collection");
        Ok(records)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, id: &str) -> ClientResult<T> {
        self.http.get(&self.item_path(id)?, &[]).await
    }

    pub(crate) async fn apply(&self, mode: DeleteMode, id: &str) -> ClientResult<()> {
        let path = mode.path(self.base, check_id(id)?);
        let _: Value = self.http.send_empty(mode.method(), &path).await?;
        info!(collection = self.base, id, action = %mode, "Lifecycle change applied");
        Ok(())
    }

    /// One concurrent call per id; every outcome is reported
    pub(crate) async fn bulk(&self, mode: DeleteMode, ids: &[RecordId]) -> BulkReport {
        let outcomes = join_all(ids.iter().map(|id| async move {
            (id.clone(), self.apply(mode, id).await)
        }))
        .await;

        let mut report = BulkReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(id),
                Err(error) => report.failed.push(BulkFailure { id, error }),
            }
        }
        info!(
            collection = self.base,
            action = %mode,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk operation finished"
        );
        report
    }
}
