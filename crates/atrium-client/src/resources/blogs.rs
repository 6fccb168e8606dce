//! Blog post endpoints under `/blogs`

use super::{BulkReport, Collection, DeleteMode};
use crate::error::ClientResult;
use crate::form::{FieldValue, FilePart, FormField, MultipartBody};
use crate::http::HttpClient;
use atrium_core::types::{Blog, BlogDraft, RecordId};
use atrium_core::view::DeletedFilter;
use reqwest::Method;
use tracing::info;

const BASE: &str = "blogs";

/// Blog payload plus an optional cover image upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogForm {
    /// Field values
    pub draft: BlogDraft,
    /// New cover image
    pub cover_image: Option<FilePart>,
}

impl BlogForm {
    /// Form without an upload
    #[must_use]
    pub const fn new(draft: BlogDraft) -> Self {
        Self {
            draft,
            cover_image: None,
        }
    }
}

/// The slug and excerpt are always sent, derived from title and content
/// when the draft leaves them out.
impl MultipartBody for BlogForm {
    fn fields(&self) -> Vec<FormField> {
        let draft = &self.draft;
        vec![
            FormField::new("title", FieldValue::Text(draft.title.trim().to_string())),
            FormField::new("slug", FieldValue::Text(draft.effective_slug())),
            FormField::new("content", FieldValue::Text(draft.content.clone())),
            FormField::new("excerpt", FieldValue::OptionalText(Some(draft.effective_excerpt()))),
            FormField::new("category", FieldValue::OptionalText(draft.category.clone())),
            FormField::new("tags", FieldValue::List(draft.tags.clone())),
            FormField::new(
                "status",
                FieldValue::OptionalText(draft.status.as_ref().map(ToString::to_string)),
            ),
            FormField::new("isFeatured", FieldValue::Bool(draft.is_featured)),
            FormField::new("coverImage", FieldValue::File(self.cover_image.clone())),
        ]
    }
}

/// Client for `/blogs`
#[derive(Debug, Clone)]
pub struct BlogsClient {
    collection: Collection,
}

impl BlogsClient {
    /// Client sharing `http`'s session store
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self {
            collection: Collection::new(http, BASE),
        }
    }

    /// Fetch all posts; deleted ones are requested only when `deleted` needs them
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn list(&self, deleted: DeletedFilter) -> ClientResult<Vec<Blog>> {
        self.collection.list(deleted).await
    }

    /// Fetch one post
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn get(&self, id: &str) -> ClientResult<Blog> {
        self.collection.get(id).await
    }

    /// Create a post
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending, or the classified HTTP failure.
    pub async fn create(&self, form: &BlogForm) -> ClientResult<Blog> {
        form.draft.check()?;
        let blog: Blog = self
            .collection
            .http()
            .send_multipart(Method::POST, BASE, form.to_form()?)
            .await?;
        info!(id = %blog.id, slug = %blog.slug, "Blog post created");
        Ok(blog)
    }

    /// Replace a post's fields
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending, or the classified HTTP failure.
    pub async fn update(&self, id: &str, form: &BlogForm) -> ClientResult<Blog> {
        form.draft.check()?;
        let path = self.collection.item_path(id)?;
        let blog: Blog = self
            .collection
            .http()
            .send_multipart(Method::PUT, &path, form.to_form()?)
            .await?;
        info!(id = %blog.id, "Blog post updated");
        Ok(blog)
    }

    /// Apply one lifecycle change
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn apply(&self, mode: DeleteMode, id: &str) -> ClientResult<()> {
        self.collection.apply(mode, id).await
    }

    /// `DELETE /blogs/soft/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn soft_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Soft, id).await
    }

    /// `PATCH /blogs/restore/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn restore(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Restore, id).await
    }

    /// `DELETE /blogs/hard/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn hard_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Hard, id).await
    }

    /// Apply one lifecycle change to many posts concurrently
    pub async fn bulk(&self, mode: DeleteMode, ids: &[RecordId]) -> BulkReport {
        self.collection.bulk(mode, ids).await
    }

    /// Soft-delete many posts
    pub async fn bulk_soft_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Soft, ids).await
    }

    /// Restore many posts
    pub async fn bulk_restore(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Restore, ids).await
    }

    /// Permanently delete many posts
    pub async fn bulk_hard_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Hard, ids).await
    }
}
