//! User administration endpoints under `/admin/users`

use super::{BulkReport, Collection, DeleteMode};
use crate::error::{ClientError, ClientResult};
use crate::http::{AuthScope, HttpClient};
use atrium_core::types::{ManagedUser, RecordId, UserUpdate};
use atrium_core::Role;
use atrium_core::view::DeletedFilter;
use reqwest::Method;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

const BASE: &str = "admin/users";

/// Update responses come back bare or as `{ "user": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum UserResponse {
    Wrapped { user: ManagedUser },
    Bare(ManagedUser),
}

impl From<UserResponse> for ManagedUser {
    fn from(response: UserResponse) -> Self {
        match response {
            UserResponse::Wrapped { user } | UserResponse::Bare(user) => user,
        }
    }
}

/// Client for `/admin/users`
#[derive(Debug, Clone)]
pub struct UsersClient {
    collection: Collection,
}

impl UsersClient {
    /// Client sharing `http`'s session store
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self {
            collection: Collection::new(http, BASE),
        }
    }

    /// Fetch all accounts; deleted ones are requested only when `deleted` needs them
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn list(&self, deleted: DeletedFilter) -> ClientResult<Vec<ManagedUser>> {
        self.collection.list(deleted).await
    }

    /// Fetch one account
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn get(&self, id: &str) -> ClientResult<ManagedUser> {
        self.collection.get(id).await
    }

    /// Change name, role or active flag
    ///
    /// When the account is the logged-in one, the cached profile is
    /// refreshed from the response.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or malformed update, the
    /// classified HTTP failure, or a storage error while refreshing the
    /// cached profile.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> ClientResult<ManagedUser> {
        if update.is_empty() {
            return Err(ClientError::validation("update", "Nothing to change"));
        }
        update.validate()?;

        let path = self.collection.item_path(id)?;
        let http = self.collection.http();
        let user: ManagedUser = http
            .send_json::<_, UserResponse>(Method::PUT, &path, update, AuthScope::Session)
            .await?
            .into();
        info!(id = %user.profile.id, role = %user.profile.role, active = user.profile.is_active, "User updated");

        let is_current = http
            .session()
            .profile()
            .is_some_and(|current| current.id == user.profile.id);
        if is_current {
            http.session().update_profile(user.profile.clone())?;
        }
        Ok(user)
    }

    /// Change an account's role
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn set_role(&self, id: &str, role: Role) -> ClientResult<ManagedUser> {
        let update = UserUpdate {
            role: Some(role),
            ..UserUpdate::default()
        };
        self.update(id, &update).await
    }

    /// Enable or disable an account
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn set_active(&self, id: &str, active: bool) -> ClientResult<ManagedUser> {
        let update = UserUpdate {
            is_active: Some(active),
            ..UserUpdate::default()
        };
        self.update(id, &update).await
    }

    /// Apply one lifecycle change
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn apply(&self, mode: DeleteMode, id: &str) -> ClientResult<()> {
        self.collection.apply(mode, id).await
    }

    /// `DELETE /admin/users/soft/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn soft_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Soft, id).await
    }

    /// `PATCH /admin/users/restore/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn restore(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Restore, id).await
    }

    /// `DELETE /admin/users/hard/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn hard_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Hard, id).await
    }

    /// Apply one lifecycle change to many accounts concurrently
    pub async fn bulk(&self, mode: DeleteMode, ids: &[RecordId]) -> BulkReport {
        self.collection.bulk(mode, ids).await
    }

    /// Soft-delete many accounts
    pub async fn bulk_soft_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Soft, ids).await
    }

    /// Restore many accounts
    pub async fn bulk_restore(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Restore, ids).await
    }

    /// Permanently delete many accounts
    pub async fn bulk_hard_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Hard, ids).await
    }
}
