//! Derived list views: search, filter, sort and paginate admin collections
//!
//! A screen owns its base collection in a [`ListState`] and recomputes the
//! visible page from scratch on every change. The base collection is never
//! reordered or filtered in place.

use crate::types::{Blog, Event, ManagedUser};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Ranking input for [`SortKey::Popular`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Popularity {
    /// Priority flag; flagged records always rank first
    pub featured: bool,
    /// Weighted score, higher ranks first
    pub score: f64,
}

/// What the view layer needs to know about a record
pub trait Listable {
    /// Backend identifier
    fn id(&self) -> &str;

    /// Fields the free-text search looks at
    fn search_fields(&self) -> Vec<&str>;

    /// Status compared by the status filter
    fn status_key(&self) -> Option<&str>;

    /// Category compared by the category filter
    fn category(&self) -> Option<&str>;

    /// Date compared by the date-range filter
    fn filter_date(&self) -> Option<DateTime<Utc>>;

    /// Creation time used by the newest/oldest orderings
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Label used by the title ordering
    fn title(&self) -> &str;

    /// Soft-deleted marker
    fn is_deleted(&self) -> bool;

    /// Update the soft-deleted marker after a delete/restore call
    fn set_deleted(&mut self, deleted: bool);

    /// Ranking input for the popularity ordering
    fn popularity(&self) -> Popularity {
        Popularity::default()
    }
}

/// Visibility of soft-deleted records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedFilter {
    /// Only live records
    #[default]
    Hide,
    /// Live and deleted records
    Include,
    /// Only deleted records
    Only,
}

impl DeletedFilter {
    const fn admits(self, deleted: bool) -> bool {
        match self {
            Self::Hide => !deleted,
            Self::Include => true,
            Self::Only => deleted,
        }
    }

    /// Whether the backend must be asked for deleted records too
    #[must_use]
    pub const fn needs_deleted(self) -> bool {
        !matches!(self, Self::Hide)
    }
}

/// Ordering of a list view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently created first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Alphabetical by title, case-insensitive
    Title,
    /// Featured first, then by descending score
    Popular,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::Oldest => write!(f, "oldest"),
            Self::Title => write!(f, "title"),
            Self::Popular => write!(f, "popular"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "latest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title" | "alphabetical" => Ok(Self::Title),
            "popular" | "popularity" => Ok(Self::Popular),
            other => Err(format!(
                "unknown sort '{other}' (expected newest, oldest, title or popular)"
            )),
        }
    }
}

/// One independent filter axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring over the searchable fields (needle is lowercase)
    Search(String),
    /// Exact status match
    Status(String),
    /// Case-insensitive category match
    Category(String),
    /// Inclusive date range; a missing bound is open
    DateRange {
        /// Lower bound
        from: Option<DateTime<Utc>>,
        /// Upper bound
        to: Option<DateTime<Utc>>,
    },
    /// Soft-delete visibility
    Deleted(DeletedFilter),
}

impl Predicate {
    /// Whether `record` passes this predicate
    pub fn matches<T: Listable + ?Sized>(&self, record: &T) -> bool {
        match self {
            Self::Search(needle) => record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            Self::Status(status) => record
                .status_key()
                .is_some_and(|value| value.eq_ignore_ascii_case(status)),
            Self::Category(category) => record
                .category()
                .is_some_and(|value| value.trim().eq_ignore_ascii_case(category)),
            Self::DateRange { from, to } => record.filter_date().is_some_and(|date| {
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            }),
            Self::Deleted(filter) => filter.admits(record.is_deleted()),
        }
    }
}

/// Ephemeral list controls for one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Free-text search
    pub search: String,
    /// Status filter
    pub status: Option<String>,
    /// Category filter
    pub category: Option<String>,
    /// Inclusive lower date bound
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper date bound
    pub date_to: Option<DateTime<Utc>>,
    /// Soft-delete visibility
    pub deleted: DeletedFilter,
    /// Ordering
    pub sort: SortKey,
    /// 1-based page number; 0 is treated as 1
    pub page: u32,
    /// Records per page
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    /// A query on page 1 with no filters
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            search: String::new(),
            status: None,
            category: None,
            date_from: None,
            date_to: None,
            deleted: DeletedFilter::Hide,
            sort: SortKey::Newest,
            page: 1,
            page_size,
        }
    }

    /// The active filter axes, in a fixed order
    ///
    /// Empty search, status and category values are not filters.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            predicates.push(Predicate::Search(needle));
        }
        if let Some(status) = non_blank(self.status.as_deref()) {
            predicates.push(Predicate::Status(status.to_string()));
        }
        if let Some(category) = non_blank(self.category.as_deref()) {
            predicates.push(Predicate::Category(category.to_string()));
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            predicates.push(Predicate::DateRange {
                from: self.date_from,
                to: self.date_to,
            });
        }
        predicates.push(Predicate::Deleted(self.deleted));

        predicates
    }

    /// Effective 1-based page
    #[must_use]
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Keep the records passing every predicate, preserving collection order
pub fn filter_records<'a, T: Listable>(records: &'a [T], predicates: &[Predicate]) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| predicates.iter().all(|p| p.matches(*record)))
        .collect()
}

/// Stable sort of `records` by `key`; ties keep collection order
pub fn sort_records<T: Listable>(records: &mut [&T], key: SortKey) {
    match key {
        SortKey::Newest => records.sort_by(|a, b| compare_dates(b.created_at(), a.created_at())),
        SortKey::Oldest => records.sort_by(|a, b| compare_dates(a.created_at(), b.created_at())),
        SortKey::Title => {
            records.sort_by_cached_key(|record| record.title().to_lowercase());
        }
        SortKey::Popular => records.sort_by(|a, b| {
            let (pa, pb) = (a.popularity(), b.popularity());
            pb.featured
                .cmp(&pa.featured)
                .then_with(|| pb.score.total_cmp(&pa.score))
        }),
    }
}

/// Records without a timestamp go last in both directions
fn compare_dates(first: Option<DateTime<Utc>>, second: Option<DateTime<Utc>>) -> Ordering {
    match (first, second) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One page of a derived view
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a, T> {
    /// Records on this page
    pub items: Vec<&'a T>,
    /// Records matching the filters across all pages
    pub total: usize,
    /// Effective 1-based page
    pub page: u32,
    /// Records per page
    pub page_size: u32,
    /// Number of pages (at least 1)
    pub total_pages: u32,
    /// Whether a later page has records
    pub has_next: bool,
    /// Whether this is not the first page
    pub has_prev: bool,
}

/// Slice one page out of `records`
///
/// Page 0 is treated as page 1; a page past the end is empty.
#[must_use]
pub fn paginate<T>(records: Vec<&T>, page: u32, page_size: u32) -> PageView<'_, T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = records.len();

    let size = page_size as usize;
    let start = (page as usize - 1).saturating_mul(size);
    let items: Vec<&T> = records.into_iter().skip(start).take(size).collect();

    let total_pages = u32::try_from(total.div_ceil(size))
        .unwrap_or(u32::MAX)
        .max(1);

    PageView {
        items,
        total,
        page,
        page_size,
        total_pages,
        has_next: start.saturating_add(size) < total,
        has_prev: page > 1,
    }
}

/// Filter, sort and paginate `records` under `query`
#[must_use]
pub fn derive_view<'a, T: Listable>(records: &'a [T], query: &ListQuery) -> PageView<'a, T> {
    let mut matched = filter_records(records, &query.predicates());
    sort_records(&mut matched, query.sort);
    paginate(matched, query.page, query.page_size)
}

/// Loading state of a screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The collection reflects the last successful fetch
    Ready,
    /// The last fetch failed; the collection is unchanged
    Failed(String),
}

/// Per-screen state: the base collection plus its list controls
#[derive(Debug, Clone)]
pub struct ListState<T> {
    records: Vec<T>,
    query: ListQuery,
    load: LoadState,
}

impl<T: Listable> Default for ListState<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<T: Listable> ListState<T> {
    /// Empty state with the given page size
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            records: Vec::new(),
            query: ListQuery::with_page_size(page_size),
            load: LoadState::Idle,
        }
    }

    /// Base collection, in backend order
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Current list controls
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Current load state
    #[must_use]
    pub const fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// Mark a fetch as started
    pub fn begin_load(&mut self) {
        self.load = LoadState::Loading;
    }

    /// Apply the outcome of a fetch
    ///
    /// On failure the previous collection is kept and the message recorded.
    pub fn finish_load<E: fmt::Display>(&mut self, result: Result<Vec<T>, E>) -> &LoadState {
        match result {
            Ok(records) => {
                self.records = records;
                self.load = LoadState::Ready;
            }
            Err(err) => self.load = LoadState::Failed(err.to_string()),
        }
        &self.load
    }

    /// Replace the record with the same id, or insert it at the front
    pub fn upsert(&mut self, record: T) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.id() == record.id()) {
            *existing = record;
        } else {
            self.records.insert(0, record);
        }
    }

    /// Remove a record after a hard delete
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Flip the soft-delete marker; returns whether the record was found
    pub fn set_deleted(&mut self, id: &str, deleted: bool) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id() == id) else {
            return false;
        };
        record.set_deleted(deleted);
        true
    }

    /// Change the search text and go back to page 1
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.query.page = 1;
    }

    /// Change the ordering and go back to page 1
    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
        self.query.page = 1;
    }

    /// Change soft-delete visibility and go back to page 1
    pub fn set_deleted_filter(&mut self, deleted: DeletedFilter) {
        self.query.deleted = deleted;
        self.query.page = 1;
    }

    /// Jump to a page
    pub fn set_page(&mut self, page: u32) {
        self.query.page = page;
    }

    /// Replace the whole query
    pub fn set_query(&mut self, query: ListQuery) {
        self.query = query;
    }

    /// The page to render, recomputed from the base collection
    #[must_use]
    pub fn view(&self) -> PageView<'_, T> {
        derive_view(&self.records, &self.query)
    }
}

impl Listable for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.location.as_deref());
        fields.extend(self.category.as_deref());
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn filter_date(&self) -> Option<DateTime<Utc>> {
        self.start_date.or(self.created_at)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }

    fn popularity(&self) -> Popularity {
        Popularity {
            featured: self.is_featured,
            score: f64::from(self.registered_count),
        }
    }
}

impl Listable for Blog {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.slug.as_str()];
        fields.extend(self.excerpt.as_deref());
        fields.extend(self.author.as_deref());
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn filter_date(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }

    #[allow(clippy::cast_precision_loss)]
    fn popularity(&self) -> Popularity {
        Popularity {
            featured: self.is_featured,
            score: self.views as f64 + 3.0 * self.likes as f64 + 5.0 * self.comments_count as f64,
        }
    }
}

impl Listable for ManagedUser {
    fn id(&self) -> &str {
        &self.profile.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.profile.name.as_str(), self.profile.email.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(if self.profile.is_active {
            "active"
        } else {
            "inactive"
        })
    }

    /// Users are grouped by role
    fn category(&self) -> Option<&str> {
        Some(match self.profile.role {
            crate::Role::User => "user",
            crate::Role::Admin => "admin",
            crate::Role::Superadmin => "superadmin",
        })
    }

    fn filter_date(&self) -> Option<DateTime<Utc>> {
        self.profile.created_at
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.profile.created_at
    }

    fn title(&self) -> &str {
        &self.profile.name
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
mod tests {
    use super::*;
    use crate::types::{BlogStatus, EventStatus};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn event(n: usize) -> Event {
        Event {
            id: format!("e{n}"),
            title: format!("Event {n:02}"),
            created_at: Some(base_time() + Duration::hours(n as i64)),
            start_date: Some(base_time() + Duration::days(n as i64)),
            ..Event::default()
        }
    }

    fn ids<T: Listable>(view: &PageView<'_, T>) -> Vec<String> {
        view.items.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_third_page_of_twenty_five_holds_the_last_item() {
        let events: Vec<Event> = (1..=25).map(event).collect();
        let query = ListQuery {
            sort: SortKey::Oldest,
            page: 3,
            page_size: 12,
            ..ListQuery::default()
        };

        let view = derive_view(&events, &query);

        assert_eq!(ids(&view), vec!["e25"]);
        assert_eq!(view.total, 25);
        assert_eq!(view.total_pages, 3);
        assert!(!view.has_next);
        assert!(view.has_prev);
    }

    #[test]
    fn test_page_zero_clamps_to_first_page() {
        let events: Vec<Event> = (1..=5).map(event).collect();
        let query = ListQuery {
            sort: SortKey::Oldest,
            page: 0,
            page_size: 2,
            ..ListQuery::default()
        };

        let view = derive_view(&events, &query);
        assert_eq!(view.page, 1);
        assert_eq!(ids(&view), vec!["e1", "e2"]);
        assert!(!view.has_prev);
        assert!(view.has_next);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let events: Vec<Event> = (1..=5).map(event).collect();
        let query = ListQuery {
            page: 40,
            page_size: 2,
            ..ListQuery::default()
        };

        let view = derive_view(&events, &query);
        assert!(view.items.is_empty());
        assert_eq!(view.total, 5);
        assert_eq!(view.total_pages, 3);
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let events: Vec<Event> = Vec::new();
        let view = derive_view(&events, &ListQuery::default());
        assert_eq!(view.total_pages, 1);
        assert!(view.items.is_empty());
    }

    #[test]
    fn test_newest_is_reverse_of_oldest() {
        let events: Vec<Event> = (1..=9).map(event).collect();
        let mut newest = ListQuery {
            page_size: 100,
            ..ListQuery::default()
        };
        let mut oldest = newest.clone();
        newest.sort = SortKey::Newest;
        oldest.sort = SortKey::Oldest;

        let mut reversed = ids(&derive_view(&events, &oldest));
        reversed.reverse();
        assert_eq!(ids(&derive_view(&events, &newest)), reversed);
    }

    #[test]
    fn test_title_sort_is_case_insensitive_and_stable() {
        let mut events = vec![event(1), event(2), event(3)];
        events[0].title = "beta".into();
        events[1].title = "Alpha".into();
        events[2].title = "alpha".into();

        let query = ListQuery {
            sort: SortKey::Title,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&events, &query)), vec!["e2", "e3", "e1"]);
    }

    #[test]
    fn test_popular_puts_featured_first_then_score() {
        let blogs = vec![
            Blog {
                id: "plain-high".into(),
                views: 1000,
                ..Blog::default()
            },
            Blog {
                id: "featured-low".into(),
                is_featured: true,
                views: 1,
                ..Blog::default()
            },
            Blog {
                id: "plain-liked".into(),
                views: 10,
                likes: 400,
                ..Blog::default()
            },
        ];
        let query = ListQuery {
            sort: SortKey::Popular,
            ..ListQuery::default()
        };

        assert_eq!(
            ids(&derive_view(&blogs, &query)),
            vec!["featured-low", "plain-liked", "plain-high"]
        );
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let mut events: Vec<Event> = (1..=6).map(event).collect();
        for (i, e) in events.iter_mut().enumerate() {
            e.status = if i % 2 == 0 {
                EventStatus::Published
            } else {
                EventStatus::Draft
            };
            e.category = Some(if i < 3 { "Music" } else { "Tech" }.into());
        }

        let query = ListQuery {
            status: Some("published".into()),
            category: Some("music".into()),
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&events, &query)), vec!["e1", "e3"]);
    }

    #[test]
    fn test_search_matches_any_field_case_insensitively() {
        let mut events: Vec<Event> = (1..=3).map(event).collect();
        events[1].location = Some("Berlin Hall".into());
        events[2].tags = vec!["BERLIN".into()];

        let query = ListQuery {
            search: "  berlin ".into(),
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&events, &query)), vec!["e2", "e3"]);
    }

    #[test]
    fn test_date_range_is_inclusive_and_open_ended() {
        let events: Vec<Event> = (1..=5).map(event).collect();
        let day = |n: i64| base_time() + Duration::days(n);

        let bounded = ListQuery {
            date_from: Some(day(2)),
            date_to: Some(day(4)),
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&events, &bounded)), vec!["e2", "e3", "e4"]);

        let from_only = ListQuery {
            date_from: Some(day(4)),
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&events, &from_only)), vec!["e4", "e5"]);

        let mut undated = events.clone();
        undated[0].start_date = None;
        undated[0].created_at = None;
        let to_only = ListQuery {
            date_to: Some(day(2)),
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&undated, &to_only)), vec!["e2"]);
    }

    #[test]
    fn test_deleted_visibility() {
        let mut events: Vec<Event> = (1..=3).map(event).collect();
        events[1].is_deleted = true;
        let mut query = ListQuery {
            sort: SortKey::Oldest,
            ..ListQuery::default()
        };

        assert_eq!(ids(&derive_view(&events, &query)), vec!["e1", "e3"]);
        query.deleted = DeletedFilter::Only;
        assert_eq!(ids(&derive_view(&events, &query)), vec!["e2"]);
        query.deleted = DeletedFilter::Include;
        assert_eq!(derive_view(&events, &query).total, 3);
    }

    #[test]
    fn test_view_does_not_touch_base_collection() {
        let events: Vec<Event> = (1..=4).map(event).collect();
        let before = events.clone();
        let query = ListQuery {
            search: "event 0".into(),
            sort: SortKey::Title,
            ..ListQuery::default()
        };
        let _ = derive_view(&events, &query);
        similar_asserts::assert_eq!(events, before);
    }

    #[test]
    fn test_list_state_soft_delete_then_restore_is_visible() {
        let mut state = ListState::new(12);
        state.begin_load();
        assert_eq!(state.load_state(), &LoadState::Loading);
        state.finish_load(Ok::<_, String>((1..=3).map(event).collect()));
        assert_eq!(state.load_state(), &LoadState::Ready);

        assert!(state.set_deleted("e2", true));
        assert!(!ids(&state.view()).contains(&"e2".to_string()));

        assert!(state.set_deleted("e2", false));
        assert!(ids(&state.view()).contains(&"e2".to_string()));
        assert!(!state.set_deleted("missing", true));
    }

    #[test]
    fn test_list_state_failed_load_keeps_records() {
        let mut state = ListState::new(12);
        state.finish_load(Ok::<_, String>(vec![event(1)]));
        state.finish_load(Err::<Vec<Event>, _>("Network down"));

        assert_eq!(state.load_state(), &LoadState::Failed("Network down".into()));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn test_list_state_upsert_and_remove() {
        let mut state = ListState::new(12);
        state.finish_load(Ok::<_, String>(vec![event(1), event(2)]));

        let mut renamed = event(2);
        renamed.title = "Renamed".into();
        state.upsert(renamed);
        state.upsert(event(3));

        assert_eq!(state.records()[0].id, "e3");
        assert_eq!(state.records()[2].title, "Renamed");
        assert!(state.remove("e1").is_some());
        assert!(state.remove("e1").is_none());
        assert_eq!(state.records().len(), 2);
    }

    #[test]
    fn test_query_changes_reset_page() {
        let mut state: ListState<Event> = ListState::new(12);
        state.set_page(4);
        state.set_search("x");
        assert_eq!(state.query().page, 1);

        state.set_page(3);
        state.set_sort(SortKey::Title);
        assert_eq!(state.query().page, 1);
    }

    #[test]
    fn test_users_filter_by_role_and_activity() {
        let mut admin = ManagedUser::default();
        admin.profile.id = "a".into();
        admin.profile.role = crate::Role::Admin;
        admin.profile.is_active = true;
        let mut user = ManagedUser::default();
        user.profile.id = "u".into();

        let users = vec![admin, user];
        let query = ListQuery {
            category: Some("admin".into()),
            status: Some("active".into()),
            ..ListQuery::default()
        };
        assert_eq!(ids(&derive_view(&users, &query)), vec!["a"]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("popularity".parse::<SortKey>().unwrap(), SortKey::Popular);
        assert!("random".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Title.to_string(), "title");
    }

    fn sample_blogs() -> Vec<Blog> {
        let statuses = [BlogStatus::Draft, BlogStatus::Published, BlogStatus::Archived];
        let categories = ["news", "guides", "releases"];
        (0..30)
            .map(|i| Blog {
                id: format!("b{i}"),
                title: format!("Post {i}"),
                slug: format!("post-{i}"),
                status: statuses[i % 3].clone(),
                category: Some(categories[(i / 3) % 3].to_string()),
                tags: if i % 4 == 0 { vec!["rust".into()] } else { vec![] },
                is_deleted: i % 7 == 0,
                created_at: Some(base_time() + Duration::hours(i as i64)),
                published_at: Some(base_time() + Duration::days(i as i64)),
                ..Blog::default()
            })
            .collect()
    }

    proptest! {
        #[test]
        fn filter_order_does_not_matter(
            search in prop::option::of("rust|post 1|2"),
            status in prop::option::of("draft|published|archived"),
            category in prop::option::of("news|guides|releases"),
            from_day in prop::option::of(0i64..30),
            deleted in prop::sample::select(vec![DeletedFilter::Hide, DeletedFilter::Include, DeletedFilter::Only]),
            seed in any::<u64>(),
        ) {
            let blogs = sample_blogs();
            let query = ListQuery {
                search: search.unwrap_or_default(),
                status,
                category,
                date_from: from_day.map(|d| base_time() + Duration::days(d)),
                deleted,
                ..ListQuery::default()
            };

            let forward = query.predicates();
            let mut shuffled = forward.clone();
            // Deterministic permutation derived from the seed.
            let len = shuffled.len();
            for i in (1..len).rev() {
                let j = (seed as usize).wrapping_add(i * 31) % (i + 1);
                shuffled.swap(i, j);
            }

            let a: Vec<&str> = filter_records(&blogs, &forward).iter().map(|b| b.id.as_str()).collect();
            let b: Vec<&str> = filter_records(&blogs, &shuffled).iter().map(|b| b.id.as_str()).collect();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn page_never_exceeds_page_size(
            count in 0usize..80,
            page in 0u32..20,
            page_size in 1u32..30,
        ) {
            let events: Vec<Event> = (1..=count).map(event).collect();
            let query = ListQuery { page, page_size, ..ListQuery::default() };
            let view = derive_view(&events, &query);
            prop_assert!(view.items.len() <= page_size as usize);
            prop_assert!(view.page >= 1);
        }
    }
}
