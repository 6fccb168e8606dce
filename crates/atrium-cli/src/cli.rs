//! Command line definitions

use atrium_core::types::{BlogStatus, EventStatus};
use atrium_core::view::{DeletedFilter, ListQuery, SortKey};
use atrium_core::Role;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface for the Atrium admin API
#[derive(Debug, Parser)]
#[command(
    name = "atrium",
    version = env!("CARGO_PKG_VERSION"),
    about = "Administer events, blog posts and users",
    long_about = "Command line client for the Atrium administration API. Logs in once, keeps the session on disk and manages events, blog posts, users and permissions."
)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the configuration
    #[arg(short, long, global = true)]
    pub(crate) log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long, global = true)]
    pub(crate) json: bool,

    /// API base URL; overrides the configuration
    #[arg(long, value_name = "URL", env = "ATRIUM_API_URL", global = true)]
    pub(crate) api_url: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Log in and remember the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "ATRIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (at least 8 characters)
        #[arg(short, long, env = "ATRIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in account
    Whoami {
        /// Check the token with the server first
        #[arg(long)]
        verify: bool,
    },

    /// Manage events
    Events {
        /// Event subcommand
        #[command(subcommand)]
        action: EventCommands,
    },

    /// Manage blog posts
    Blogs {
        /// Blog subcommand
        #[command(subcommand)]
        action: BlogCommands,
    },

    /// Manage user accounts
    Users {
        /// User subcommand
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage permissions
    Permissions {
        /// Permission subcommand
        #[command(subcommand)]
        action: PermissionCommands,
    },

    /// Inspect configuration
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Event subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum EventCommands {
    /// List events
    List(ListArgs),

    /// Show one event as JSON
    Show {
        /// Event id
        id: String,
    },

    /// Create an event
    Create(EventArgs),

    /// Update an event; unspecified fields keep their current values
    Update {
        /// Event id
        id: String,

        /// New values
        #[command(flatten)]
        fields: EventArgs,
    },

    /// Soft-delete events, or remove them permanently with --hard
    Delete(RemoveArgs),

    /// Restore soft-deleted events
    Restore(IdsArgs),
}

/// Blog subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum BlogCommands {
    /// List blog posts
    List(ListArgs),

    /// Show one post as JSON
    Show {
        /// Post id
        id: String,
    },

    /// Create a post
    Create(BlogArgs),

    /// Update a post; unspecified fields keep their current values
    Update {
        /// Post id
        id: String,

        /// New values
        #[command(flatten)]
        fields: BlogArgs,
    },

    /// Soft-delete posts, or remove them permanently with --hard
    Delete(RemoveArgs),

    /// Restore soft-deleted posts
    Restore(IdsArgs),

    /// Print the slug a title would get
    Slug {
        /// Title to convert
        title: String,
    },
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum UserCommands {
    /// List user accounts
    List(ListArgs),

    /// Show one account as JSON
    Show {
        /// User id
        id: String,
    },

    /// Change name, role or active flag
    Update {
        /// User id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New role (user, admin, superadmin)
        #[arg(long)]
        role: Option<Role>,

        /// Enable or disable the account
        #[arg(long)]
        active: Option<bool>,
    },

    /// Soft-delete accounts, or remove them permanently with --hard
    Delete(RemoveArgs),

    /// Restore soft-deleted accounts
    Restore(IdsArgs),
}

/// Permission subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum PermissionCommands {
    /// List every known permission
    Catalog,

    /// Show one account's permissions
    Show {
        /// User id
        user: String,
    },

    /// Give an account a permission
    Grant {
        /// User id
        user: String,
        /// Permission name
        permission: String,
    },

    /// Take a permission away from an account
    Revoke {
        /// User id
        user: String,
        /// Permission name
        permission: String,
    },
}

/// Configuration subcommands
#[derive(Debug, Subcommand)]
pub(crate) enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,
}

/// Search, filter, sort and page options shared by list commands
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct ListArgs {
    /// Case-insensitive text search
    #[arg(short, long)]
    pub(crate) search: Option<String>,

    /// Only records with this status
    #[arg(long)]
    pub(crate) status: Option<String>,

    /// Only records in this category (users: role)
    #[arg(long)]
    pub(crate) category: Option<String>,

    /// Only records dated on or after this day or instant
    #[arg(long, value_name = "DATE", value_parser = parse_from)]
    pub(crate) from: Option<DateTime<Utc>>,

    /// Only records dated on or before this day or instant
    #[arg(long, value_name = "DATE", value_parser = parse_to)]
    pub(crate) to: Option<DateTime<Utc>>,

    /// Include soft-deleted records
    #[arg(long, conflicts_with = "only_deleted")]
    pub(crate) deleted: bool,

    /// Show only soft-deleted records
    #[arg(long)]
    pub(crate) only_deleted: bool,

    /// Order: newest, oldest, title or popular
    #[arg(long, default_value = "newest")]
    pub(crate) sort: SortKey,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub(crate) page: u32,

    /// Records per page; defaults to the configured page size
    #[arg(long)]
    pub(crate) page_size: Option<u32>,
}

impl ListArgs {
    /// Visibility of soft-deleted records
    #[must_use]
    pub(crate) const fn deleted_filter(&self) -> DeletedFilter {
        if self.only_deleted {
            DeletedFilter::Only
        } else if self.deleted {
            DeletedFilter::Include
        } else {
            DeletedFilter::Hide
        }
    }

    /// The list query these options describe
    #[must_use]
    pub(crate) fn to_query(&self, default_page_size: u32) -> ListQuery {
        ListQuery {
            search: self.search.clone().unwrap_or_default(),
            status: self.status.clone(),
            category: self.category.clone(),
            date_from: self.from,
            date_to: self.to,
            deleted: self.deleted_filter(),
            sort: self.sort,
            page: self.page,
            page_size: self.page_size.unwrap_or(default_page_size),
        }
    }
}

/// Ids for lifecycle commands
#[derive(Debug, Clone, Args)]
pub(crate) struct IdsArgs {
    /// Record ids
    #[arg(required = true, num_args = 1..)]
    pub(crate) ids: Vec<String>,
}

/// Ids plus the delete mode
#[derive(Debug, Clone, Args)]
pub(crate) struct RemoveArgs {
    /// Record ids
    #[arg(required = true, num_args = 1..)]
    pub(crate) ids: Vec<String>,

    /// Delete permanently instead of soft-deleting
    #[arg(long)]
    pub(crate) hard: bool,
}

/// Event fields; all optional so the same set serves create and update
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct EventArgs {
    /// Title
    #[arg(long)]
    pub(crate) title: Option<String>,

    /// Description
    #[arg(long)]
    pub(crate) description: Option<String>,

    /// Category
    #[arg(long)]
    pub(crate) category: Option<String>,

    /// Venue or address
    #[arg(long)]
    pub(crate) location: Option<String>,

    /// Start, as RFC 3339 or YYYY-MM-DD
    #[arg(long, value_parser = parse_from)]
    pub(crate) start: Option<DateTime<Utc>>,

    /// End, as RFC 3339 or YYYY-MM-DD
    #[arg(long, value_parser = parse_to)]
    pub(crate) end: Option<DateTime<Utc>>,

    /// Status (draft, published, cancelled, completed)
    #[arg(long, value_parser = parse_event_status)]
    pub(crate) status: Option<EventStatus>,

    /// Seat limit
    #[arg(long)]
    pub(crate) capacity: Option<u32>,

    /// Tag; repeat for several
    #[arg(long = "tag", value_name = "TAG")]
    pub(crate) tags: Vec<String>,

    /// Pin to the top of listings
    #[arg(long)]
    pub(crate) featured: Option<bool>,

    /// Image file to upload; repeat for several
    #[arg(long = "image", value_name = "FILE")]
    pub(crate) images: Vec<PathBuf>,
}

/// Blog fields; all optional so the same set serves create and update
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct BlogArgs {
    /// Title
    #[arg(long)]
    pub(crate) title: Option<String>,

    /// Slug; derived from the title when omitted
    #[arg(long)]
    pub(crate) slug: Option<String>,

    /// Body text
    #[arg(long, conflicts_with = "content_file")]
    pub(crate) content: Option<String>,

    /// Read the body from a file
    #[arg(long, value_name = "FILE")]
    pub(crate) content_file: Option<PathBuf>,

    /// Summary; derived from the body when omitted
    #[arg(long)]
    pub(crate) excerpt: Option<String>,

    /// Category
    #[arg(long)]
    pub(crate) category: Option<String>,

    /// Tag; repeat for several
    #[arg(long = "tag", value_name = "TAG")]
    pub(crate) tags: Vec<String>,

    /// Status (draft, published, archived)
    #[arg(long, value_parser = parse_blog_status)]
    pub(crate) status: Option<BlogStatus>,

    /// Pin to the top of listings
    #[arg(long)]
    pub(crate) featured: Option<bool>,

    /// Cover image file to upload
    #[arg(long, value_name = "FILE")]
    pub(crate) cover: Option<PathBuf>,
}

fn parse_instant(value: &str, day_time: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|day| day.and_time(day_time).and_utc())
        .map_err(|_| format!("'{value}' is not a date (use YYYY-MM-DD or RFC 3339)"))
}

/// Lower bound: a bare day means its first instant
pub(crate) fn parse_from(value: &str) -> Result<DateTime<Utc>, String> {
    parse_instant(value, NaiveTime::MIN)
}

/// Upper bound: a bare day means its last instant, so the day is included
pub(crate) fn parse_to(value: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    parse_instant(value, end_of_day)
}

fn parse_event_status(value: &str) -> Result<EventStatus, String> {
    match EventStatus::from(value.to_string()) {
        EventStatus::Other(other) => Err(format!(
            "unknown status '{other}' (expected draft, published, cancelled or completed)"
        )),
        status => Ok(status),
    }
}

fn parse_blog_status(value: &str) -> Result<BlogStatus, String> {
    match BlogStatus::from(value.to_string()) {
        BlogStatus::Other(other) => Err(format!(
            "unknown status '{other}' (expected draft, published or archived)"
        )),
        status => Ok(status),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("2024-05-01", "2024-05-01T00:00:00Z")]
    #[case("2024-05-01T12:30:00+02:00", "2024-05-01T10:30:00Z")]
    fn test_parse_from(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_from(input).unwrap(), expected.parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_parse_to_includes_the_whole_day() {
        let to = parse_to("2024-05-01").unwrap();
        assert_eq!(to.to_rfc3339(), "2024-05-01T23:59:59.999+00:00");
        assert!(parse_to("yesterday").is_err());
    }

    #[test]
    fn test_list_args_build_query() {
        let cli = Cli::try_parse_from([
            "atrium", "events", "list", "--search", "meetup", "--only-deleted", "--sort",
            "popular", "--page", "0",
        ])
        .unwrap();

        let Commands::Events {
            action: EventCommands::List(args),
        } = cli.command
        else {
            panic!("expected events list");
        };
        let query = args.to_query(12);

        assert_eq!(query.search, "meetup");
        assert_eq!(query.deleted, DeletedFilter::Only);
        assert_eq!(query.sort, SortKey::Popular);
        assert_eq!(query.page, 0);
        assert_eq!(query.effective_page(), 1);
        assert_eq!(query.page_size, 12);
    }

    #[test]
    fn test_deleted_flags_conflict() {
        let parsed = Cli::try_parse_from(["atrium", "blogs", "list", "--deleted", "--only-deleted"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_delete_requires_ids_and_takes_hard() {
        assert!(Cli::try_parse_from(["atrium", "events", "delete"]).is_err());

        let cli = Cli::try_parse_from(["atrium", "events", "delete", "a", "b", "--hard"]).unwrap();
        let Commands::Events {
            action: EventCommands::Delete(args),
        } = cli.command
        else {
            panic!("expected events delete");
        };
        assert_eq!(args.ids, vec!["a", "b"]);
        assert!(args.hard);
    }

    #[test]
    fn test_status_values_are_checked() {
        assert_eq!(parse_event_status("Published").unwrap(), EventStatus::Published);
        assert!(parse_event_status("postponed").is_err());
        assert_eq!(parse_blog_status("archived").unwrap(), BlogStatus::Archived);
    }

    #[test]
    fn test_user_update_parses_role() {
        let cli = Cli::try_parse_from([
            "atrium", "users", "update", "u1", "--role", "superadmin", "--active", "false",
        ])
        .unwrap();
        let Commands::Users {
            action: UserCommands::Update { role, active, .. },
        } = cli.command
        else {
            panic!("expected users update");
        };
        assert_eq!(role, Some(Role::Superadmin));
        assert_eq!(active, Some(false));
    }
}
