//! Plain-text rendering of records and reports

use atrium_client::BulkReport;
use atrium_core::utils::reading_time_minutes;
use atrium_core::view::PageView;
use atrium_core::{Blog, Event, ManagedUser};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

const TITLE_WIDTH: usize = 36;

/// Shorten `text` to `width` characters, marking the cut with `…`
#[must_use]
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn day(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn flags(featured: bool, deleted: bool) -> &'static str {
    match (featured, deleted) {
        (_, true) => "deleted",
        (true, false) => "featured",
        (false, false) => "",
    }
}

fn footer<T>(view: &PageView<'_, T>) -> String {
    format!(
        "Page {} of {} ({} total)",
        view.page, view.total_pages, view.total
    )
}

/// Table of events plus the page footer
#[must_use]
pub(crate) fn events_table(view: &PageView<'_, Event>) -> String {
    let mut out = format!(
        "{:<26} {:<TITLE_WIDTH$} {:<10} {:<10} {:>9} {}\n",
        "ID", "TITLE", "STATUS", "START", "SEATS", "FLAGS"
    );
    for event in &view.items {
        let seats = event.capacity.map_or_else(
            || event.registered_count.to_string(),
            |cap| format!("{}/{cap}", event.registered_count),
        );
        let _ = writeln!(
            out,
            "{:<26} {:<TITLE_WIDTH$} {:<10} {:<10} {:>9} {}",
            truncate(&event.id, 26),
            truncate(&event.title, TITLE_WIDTH),
            event.status.as_str(),
            day(event.start_date),
            seats,
            flags(event.is_featured, event.is_deleted),
        );
    }
    out.push_str(&footer(view));
    out
}

/// Table of blog posts plus the page footer
#[must_use]
pub(crate) fn blogs_table(view: &PageView<'_, Blog>) -> String {
    let mut out = format!(
        "{:<26} {:<TITLE_WIDTH$} {:<10} {:<10} {:>7} {:>5} {}\n",
        "ID", "TITLE", "STATUS", "PUBLISHED", "VIEWS", "READ", "FLAGS"
    );
    for blog in &view.items {
        let _ = writeln!(
            out,
            "{:<26} {:<TITLE_WIDTH$} {:<10} {:<10} {:>7} {:>5} {}",
            truncate(&blog.id, 26),
            truncate(&blog.title, TITLE_WIDTH),
            blog.status.as_str(),
            day(blog.published_at),
            blog.views,
            format!("{}m", reading_time_minutes(&blog.content)),
            flags(blog.is_featured, blog.is_deleted),
        );
    }
    out.push_str(&footer(view));
    out
}

/// Table of user accounts plus the page footer
#[must_use]
pub(crate) fn users_table(view: &PageView<'_, ManagedUser>) -> String {
    let mut out = format!(
        "{:<26} {:<24} {:<30} {:<10} {}\n",
        "ID", "NAME", "EMAIL", "ROLE", "STATE"
    );
    for user in &view.items {
        let profile = &user.profile;
        let state = if user.is_deleted {
            "deleted"
        } else if profile.is_active {
            "active"
        } else {
            "inactive"
        };
        let _ = writeln!(
            out,
            "{:<26} {:<24} {:<30} {:<10} {}",
            truncate(&profile.id, 26),
            truncate(&profile.name, 24),
            truncate(&profile.email, 30),
            profile.role.to_string(),
            state,
        );
    }
    out.push_str(&footer(view));
    out
}

/// Summary line plus one line per failure
#[must_use]
pub(crate) fn bulk_summary(action: &str, report: &BulkReport) -> String {
    format!("{action}: {report}")
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use atrium_core::view::{ListQuery, derive_view};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("short", 10, "short")]
    #[case("exactly ten", 11, "exactly ten")]
    #[case("a rather long title", 8, "a rathe…")]
    #[case("ünïcödé text", 5, "ünïc…")]
    fn test_truncate(#[case] input: &str, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(truncate(input, width), expected);
    }

    #[test]
    fn test_events_table_has_footer() {
        let events: Vec<Event> = (0..15)
            .map(|i| Event {
                id: format!("e{i}"),
                title: format!("Event {i}"),
                ..Event::default()
            })
            .collect();
        let view = derive_view(&events, &ListQuery::default());

        let table = events_table(&view);
        assert!(table.starts_with("ID"));
        assert!(table.ends_with("Page 1 of 2 (15 total)"));
        assert_eq!(table.lines().count(), 1 + 12 + 1);
    }

    #[test]
    fn test_empty_table_still_reports_one_page() {
        let view = derive_view::<Blog>(&[], &ListQuery::default());
        assert!(blogs_table(&view).ends_with("Page 1 of 1 (0 total)"));
    }
}
