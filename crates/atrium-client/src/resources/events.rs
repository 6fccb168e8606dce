//! Event management endpoints under `/events`

use super::{BulkReport, Collection, DeleteMode};
use crate::error::ClientResult;
use crate::form::{FieldValue, FilePart, FormField, MultipartBody};
use crate::http::HttpClient;
use atrium_core::types::{Event, EventDraft, RecordId};
use atrium_core::view::DeletedFilter;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use tracing::info;

const BASE: &str = "events";

/// Event payload plus its image uploads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventForm {
    /// Field values
    pub draft: EventDraft,
    /// New images to upload
    pub images: Vec<FilePart>,
    /// Already uploaded image URLs to keep on update
    pub existing_images: Vec<String>,
}

impl EventForm {
    /// Form without uploads
    #[must_use]
    pub fn new(draft: EventDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> FieldValue {
    FieldValue::OptionalText(value.map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

impl MultipartBody for EventForm {
    fn fields(&self) -> Vec<FormField> {
        let draft = &self.draft;
        vec![
            FormField::new("title", FieldValue::Text(draft.title.trim().to_string())),
            FormField::new("description", FieldValue::Text(draft.description.clone())),
            FormField::new("category", FieldValue::OptionalText(draft.category.clone())),
            FormField::new("location", FieldValue::OptionalText(draft.location.clone())),
            FormField::new("startDate", timestamp(draft.start_date)),
            FormField::new("endDate", timestamp(draft.end_date)),
            FormField::new(
                "status",
                FieldValue::OptionalText(draft.status.as_ref().map(ToString::to_string)),
            ),
            FormField::new(
                "capacity",
                FieldValue::OptionalText(draft.capacity.map(|c| c.to_string())),
            ),
            FormField::new("tags", FieldValue::List(draft.tags.clone())),
            FormField::new("isFeatured", FieldValue::Bool(draft.is_featured)),
            FormField::new("existingImages", FieldValue::Repeated(self.existing_images.clone())),
            FormField::new("images", FieldValue::Files(self.images.clone())),
        ]
    }
}

/// Client for `/events`
#[derive(Debug, Clone)]
pub struct EventsClient {
    collection: Collection,
}

impl EventsClient {
    /// Client sharing `http`'s session store
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self {
            collection: Collection::new(http, BASE),
        }
    }

    /// Fetch all events; deleted ones are requested only when `deleted` needs them
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn list(&self, deleted: DeletedFilter) -> ClientResult<Vec<Event>> {
        self.collection.list(deleted).await
    }

    /// Fetch one event
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn get(&self, id: &str) -> ClientResult<Event> {
        self.collection.get(id).await
    }

    /// Create an event
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending, or the classified HTTP failure.
    pub async fn create(&self, form: &EventForm) -> ClientResult<Event> {
        form.draft.check()?;
        let event: Event = self
            .collection
            .http()
            .send_multipart(Method::POST, BASE, form.to_form()?)
            .await?;
        info!(id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    /// Replace an event's fields
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending, or the classified HTTP failure.
    pub async fn update(&self, id: &str, form: &EventForm) -> ClientResult<Event> {
        form.draft.check()?;
        let path = self.collection.item_path(id)?;
        let event: Event = self
            .collection
            .http()
            .send_multipart(Method::PUT, &path, form.to_form()?)
            .await?;
        info!(id = %event.id, "Event updated");
        Ok(event)
    }

    /// Apply one lifecycle change
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn apply(&self, mode: DeleteMode, id: &str) -> ClientResult<()> {
        self.collection.apply(mode, id).await
    }

    /// `DELETE /events/soft/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn soft_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Soft, id).await
    }

    /// `PATCH /events/restore/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn restore(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Restore, id).await
    }

    /// `DELETE /events/hard/:id`
    ///
    /// # Errors
    ///
    /// Returns the classified HTTP failure.
    pub async fn hard_delete(&self, id: &str) -> ClientResult<()> {
        self.apply(DeleteMode::Hard, id).await
    }

    /// Apply one lifecycle change to many events concurrently
    pub async fn bulk(&self, mode: DeleteMode, ids: &[RecordId]) -> BulkReport {
        self.collection.bulk(mode, ids).await
    }

    /// Soft-delete many events
    pub async fn bulk_soft_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Soft, ids).await
    }

    /// Restore many events
    pub async fn bulk_restore(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Restore, ids).await
    }

    /// Permanently delete many events
    pub async fn bulk_hard_delete(&self, ids: &[RecordId]) -> BulkReport {
        self.bulk(DeleteMode::Hard, ids).await
    }
}
