//! Domain types shared by the client and the command line front end
//!
//! Records mirror the backend's JSON (camelCase, `_id` accepted as `id`).
//! Fields the client does not interpret are kept in `extra` so a record can
//! be shown or re-sent without loss.

use crate::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use validator::Validate;

/// Backend record identifier
pub type RecordId = String;

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account
    #[default]
    User,
    /// Administrator
    Admin,
    /// Administrator that also manages other administrators
    Superadmin,
}

impl Role {
    /// Whether this role may use the admin surfaces at all
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::Superadmin => write!(f, "superadmin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Profile of an authenticated account, as cached client-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Account identifier
    #[serde(alias = "_id")]
    pub id: RecordId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: Role,
    /// Fine-grained permission keys
    pub permissions: BTreeSet<String>,
    /// Whether the account is enabled
    pub is_active: bool,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Whether this profile holds `permission` (superadmins hold every permission)
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role == Role::Superadmin || self.permissions.contains(permission)
    }
}

/// An authenticated session: bearer token plus the profile it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// Cached profile
    pub user: Profile,
}

/// Body of a successful login or signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Issued bearer token
    pub token: String,
    /// Profile of the logged-in account
    pub user: Profile,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

/// Credentials for `/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    /// Account password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration payload for `/auth/signup`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    /// Account email
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    /// Account password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Event lifecycle status
///
/// Unknown strings from the backend are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    /// Not yet visible to the public
    #[default]
    Draft,
    /// Publicly listed
    Published,
    /// Called off
    Cancelled,
    /// Already took place
    Completed,
    /// Any other backend value
    Other(String),
}

impl EventStatus {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "draft" => Self::Draft,
            "published" => Self::Published,
            "cancelled" | "canceled" => Self::Cancelled,
            "completed" => Self::Completed,
            _ => Self::Other(value),
        }
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as returned by `/events`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    /// Identifier
    #[serde(alias = "_id")]
    pub id: RecordId,
    /// Title
    pub title: String,
    /// Long description
    pub description: String,
    /// Category label
    pub category: Option<String>,
    /// Venue or address
    pub location: Option<String>,
    /// Start time
    pub start_date: Option<DateTime<Utc>>,
    /// End time
    pub end_date: Option<DateTime<Utc>>,
    /// Lifecycle status
    pub status: EventStatus,
    /// Seat limit
    pub capacity: Option<u32>,
    /// Number of registrations so far
    pub registered_count: u32,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Image URLs
    pub images: Vec<String>,
    /// Pinned to the top of listings
    pub is_featured: bool,
    /// Soft-deleted marker
    pub is_deleted: bool,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Create/update payload for an event (images travel separately as files)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Title
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    /// Long description
    pub description: String,
    /// Category label
    pub category: Option<String>,
    /// Venue or address
    pub location: Option<String>,
    /// Start time
    pub start_date: Option<DateTime<Utc>>,
    /// End time
    pub end_date: Option<DateTime<Utc>>,
    /// Lifecycle status
    pub status: Option<EventStatus>,
    /// Seat limit
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<u32>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Pinned to the top of listings
    pub is_featured: bool,
}

impl EventDraft {
    /// Validate field rules and the start/end ordering
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first offending field.
    pub fn check(&self) -> crate::Result<()> {
        self.validate()?;
        require_text("title", &self.title, "Title is required")?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(crate::Error::validation(
                "endDate",
                "End date must not be before the start date",
            ));
        }
        Ok(())
    }
}

/// Length checks count whitespace; a field that is only whitespace is still empty
fn require_text(field: &str, value: &str, message: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::Error::validation(field, message));
    }
    Ok(())
}

/// Blog post lifecycle status
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlogStatus {
    /// Work in progress
    #[default]
    Draft,
    /// Live
    Published,
    /// Hidden from listings but kept
    Archived,
    /// Any other backend value
    Other(String),
}

impl BlogStatus {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for BlogStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "draft" => Self::Draft,
            "published" => Self::Published,
            "archived" => Self::Archived,
            _ => Self::Other(value),
        }
    }
}

impl From<BlogStatus> for String {
    fn from(status: BlogStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blog post as returned by `/blogs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Blog {
    /// Identifier
    #[serde(alias = "_id")]
    pub id: RecordId,
    /// Title
    pub title: String,
    /// URL slug
    pub slug: String,
    /// Body (markdown or HTML, opaque to the client)
    pub content: String,
    /// Short summary
    pub excerpt: Option<String>,
    /// Category label
    pub category: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Author display name
    pub author: Option<String>,
    /// Lifecycle status
    pub status: BlogStatus,
    /// Pinned to the top of listings
    pub is_featured: bool,
    /// Soft-deleted marker
    pub is_deleted: bool,
    /// View counter
    pub views: u64,
    /// Like counter
    pub likes: u64,
    /// Comment counter
    pub comments_count: u64,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Publication time
    pub published_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Create/update payload for a blog post (the cover image travels as a file)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    /// Title
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    /// Explicit slug; derived from the title when absent
    pub slug: Option<String>,
    /// Body
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    /// Short summary; derived from the content when absent
    pub excerpt: Option<String>,
    /// Category label
    pub category: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Lifecycle status
    pub status: Option<BlogStatus>,
    /// Pinned to the top of listings
    pub is_featured: bool,
}

/// Maximum excerpt length derived from content
pub const EXCERPT_LENGTH: usize = 160;

impl BlogDraft {
    /// Validate field rules and the resulting slug
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first offending field.
    pub fn check(&self) -> crate::Result<()> {
        self.validate()?;
        require_text("title", &self.title, "Title is required")?;
        require_text("content", &self.content, "Content is required")?;
        if self.effective_slug().is_empty() {
            return Err(crate::Error::validation(
                "slug",
                "Title must contain at least one letter or digit",
            ));
        }
        Ok(())
    }

    /// The slug to send: the explicit one (normalized) or one derived from the title
    #[must_use]
    pub fn effective_slug(&self) -> String {
        self.slug
            .as_deref()
            .map(utils::slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| utils::slugify(&self.title))
    }

    /// The excerpt to send: the explicit one or a prefix of the content
    #[must_use]
    pub fn effective_excerpt(&self) -> String {
        self.excerpt
            .as_deref()
            .map(str::trim)
            .filter(|excerpt| !excerpt.is_empty())
            .map_or_else(
                || utils::excerpt(&self.content, EXCERPT_LENGTH),
                ToString::to_string,
            )
    }
}

/// A user account as seen from the admin user list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    /// Account profile
    #[serde(flatten)]
    pub profile: Profile,
    /// Soft-deleted marker
    #[serde(default)]
    pub is_deleted: bool,
}

/// Admin changes to a user account; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: Option<String>,
    /// New role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Enable or disable the account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Whether the update would change anything
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.is_active.is_none()
    }
}

/// Entry of the permission catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permission {
    /// Permission key, e.g. `events:write`
    #[serde(alias = "key")]
    pub name: String,
    /// Human readable description
    pub description: Option<String>,
    /// Grouping label
    pub category: Option<String>,
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_event_accepts_mongo_id_and_keeps_extra_fields() {
        let event: Event = serde_json::from_value(json!({
            "_id": "64f0c2",
            "title": "Launch party",
            "status": "published",
            "registeredCount": 42,
            "isFeatured": true,
            "createdAt": "2024-05-01T10:00:00Z",
            "organizer": "Ops team"
        }))
        .unwrap();

        assert_eq!(event.id, "64f0c2");
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.registered_count, 42);
        assert!(event.is_featured);
        assert!(!event.is_deleted);
        assert_eq!(event.extra.get("organizer"), Some(&json!("Ops team")));
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let event: Event =
            serde_json::from_value(json!({"id": "1", "title": "x", "status": "postponed"}))
                .unwrap();
        assert_eq!(event.status, EventStatus::Other("postponed".into()));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["status"], json!("postponed"));
    }

    #[test]
    fn test_managed_user_flattens_profile() {
        let user: ManagedUser = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "superadmin",
            "permissions": ["events:write"],
            "isActive": true,
            "isDeleted": true
        }))
        .unwrap();

        assert_eq!(user.profile.id, "u1");
        assert_eq!(user.profile.role, Role::Superadmin);
        assert!(user.profile.is_active);
        assert!(user.is_deleted);
        assert!(user.profile.has_permission("anything:at-all"));
    }

    #[test]
    fn test_permission_checks_for_admins() {
        let profile = Profile {
            role: Role::Admin,
            permissions: ["blogs:write".to_string()].into_iter().collect(),
            ..Profile::default()
        };
        assert!(profile.has_permission("blogs:write"));
        assert!(!profile.has_permission("users:delete"));
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" superadmin ".parse::<Role>().unwrap(), Role::Superadmin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Superadmin.to_string(), "superadmin");
    }

    #[test]
    fn test_login_request_validation() {
        let bad = LoginRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        assert!(bad.validate().is_err());

        let good = LoginRequest {
            email: "admin@example.com".into(),
            password: "secret".into(),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_event_draft_rejects_inverted_dates() {
        let draft = EventDraft {
            title: "Conference".into(),
            start_date: Some("2024-06-02T09:00:00Z".parse().unwrap()),
            end_date: Some("2024-06-01T09:00:00Z".parse().unwrap()),
            ..EventDraft::default()
        };

        match draft.check().unwrap_err() {
            crate::Error::Validation { field, .. } => assert_eq!(field, "endDate"),
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_event_draft_rejects_blank_title() {
        let draft = EventDraft {
            title: " \t ".into(),
            start_date: Some("2024-06-01T09:00:00Z".parse().unwrap()),
            ..EventDraft::default()
        };

        match draft.check().unwrap_err() {
            crate::Error::Validation { field, message } => {
                assert_eq!(field, "title");
                assert_eq!(message, "Title is required");
            }
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_blog_draft_rejects_blank_title_even_with_slug() {
        let draft = BlogDraft {
            title: "   ".into(),
            slug: Some("launch".into()),
            content: "body".into(),
            ..BlogDraft::default()
        };
        match draft.check().unwrap_err() {
            crate::Error::Validation { field, .. } => assert_eq!(field, "title"),
            other => unreachable!("unexpected error {other:?}"),
        }

        let blank_body = BlogDraft {
            title: "Launch".into(),
            content: "\n\n".into(),
            ..BlogDraft::default()
        };
        match blank_body.check().unwrap_err() {
            crate::Error::Validation { field, .. } => assert_eq!(field, "content"),
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_blog_draft_derives_slug_and_excerpt() {
        let draft = BlogDraft {
            title: "Hello, World! 2024".into(),
            content: "Short body".into(),
            ..BlogDraft::default()
        };

        assert_eq!(draft.effective_slug(), "hello-world-2024");
        assert_eq!(draft.effective_excerpt(), "Short body");
        assert!(draft.check().is_ok());

        let explicit = BlogDraft {
            slug: Some("Custom Slug".into()),
            excerpt: Some("  Given summary ".into()),
            ..draft
        };
        assert_eq!(explicit.effective_slug(), "custom-slug");
        assert_eq!(explicit.effective_excerpt(), "Given summary");
    }

    #[test]
    fn test_blog_draft_without_sluggable_title_fails() {
        let draft = BlogDraft {
            title: "!!!".into(),
            content: "body".into(),
            ..BlogDraft::default()
        };
        assert!(draft.check().is_err());
    }

    #[test]
    fn test_user_update_skips_absent_fields() {
        let update = UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"isActive": false})
        );
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
    }
}
