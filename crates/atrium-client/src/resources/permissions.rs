//! Permission catalog and per-user grants under `/permissions`

use super::check_id;
use crate::error::{ClientError, ClientResult};
use crate::http::{AuthScope, HttpClient};
use atrium_core::types::Permission;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::info;

/// Permission list, bare or as `{ "permissions": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionList {
    Wrapped { permissions: BTreeSet<String> },
    Bare(BTreeSet<String>),
}

impl From<PermissionList> for BTreeSet<String> {
    fn from(list: PermissionList) -> Self {
        match list {
            PermissionList::Wrapped { permissions } | PermissionList::Bare(permissions) => {
                permissions
            }
        }
    }
}

#[derive(Serialize)]
struct SetPermissions<'a> {
    permissions: &'a BTreeSet<String>,
}

/// Client for `/permissions`
#[derive(Debug, Clone)]
pub struct PermissionsClient {
    http: HttpClient,
}

impl PermissionsClient {
    /// Client sharing `http`'s session store
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Every permission the backend knows about
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn catalog(&self) -> ClientResult<Vec<Permission>> {
        self.http.get("permissions", &[]).await
    }

    /// Permissions held by one account
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn for_user(&self, user_id: &str) -> ClientResult<BTreeSet<String>> {
        let path = format!("permissions/user/{}", check_id(user_id)?);
        let list: PermissionList = self.http.get(&path, &[]).await?;
        Ok(list.into())
    }

    /// Replace one account's permissions
    ///
    /// The cached profile is refreshed when the account is the logged-in one.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure, or a storage error while
    /// refreshing the cached profile.
    pub async fn set_for_user(
        &self,
        user_id: &str,
        permissions: &BTreeSet<String>,
    ) -> ClientResult<BTreeSet<String>> {
        if permissions.iter().any(|p| p.trim().is_empty()) {
            return Err(ClientError::validation("permissions", "Permission names must not be empty"));
        }
        let user_id = check_id(user_id)?;
        let path = format!("permissions/user/{user_id}");
        let body = SetPermissions { permissions };

        let response: Value = self
            .http
            .send_json(Method::PUT, &path, &body, AuthScope::Session)
            .await?;
        // Some deployments acknowledge without echoing the list back.
        let stored = serde_json::from_value::<PermissionList>(response)
            .map_or_else(|_| permissions.clone(), BTreeSet::from);
        info!(user = user_id, count = stored.len(), "Permissions updated");

        if let Some(mut profile) = self.http.session().profile()
            && profile.id == user_id
        {
            profile.permissions.clone_from(&stored);
            self.http.session().update_profile(profile)?;
        }
        Ok(stored)
    }

    /// Add one permission, keeping the others
    ///
    /// Skips the write when the account already holds it.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure of either call.
    pub async fn grant(&self, user_id: &str, permission: &str) -> ClientResult<BTreeSet<String>> {
        let mut permissions = self.for_user(user_id).await?;
        if !permissions.insert(permission.trim().to_string()) {
            return Ok(permissions);
        }
        self.set_for_user(user_id, &permissions).await
    }

    /// Remove one permission, keeping the others
    ///
    /// Skips the write when the account does not hold it.
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure of either call.
    pub async fn revoke(&self, user_id: &str, permission: &str) -> ClientResult<BTreeSet<String>> {
        let mut permissions = self.for_user(user_id).await?;
        if !permissions.remove(permission.trim()) {
            return Ok(permissions);
        }
        self.set_for_user(user_id, &permissions).await
    }
}
