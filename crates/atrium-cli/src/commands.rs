//! Command handlers

use crate::cli::{
    BlogArgs, BlogCommands, Commands, ConfigCommands, EventArgs, EventCommands, IdsArgs, ListArgs,
    PermissionCommands, RemoveArgs, UserCommands,
};
use crate::output;
use atrium_client::{
    BlogForm, BulkReport, ClientError, ClientResult, Dashboard, DeleteMode, EventForm, FilePart,
};
use atrium_core::types::{BlogDraft, EventDraft, LoginRequest, SignupRequest, UserUpdate};
use atrium_core::utils::slugify;
use atrium_core::view::ListState;
use atrium_core::{Blog, Config, Event, Listable};
use serde::Serialize;
use std::future::Future;
use tracing::debug;

/// How a command ended when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Everything asked for was done
    Complete,
    /// Some items of a bulk operation failed
    Partial,
}

impl From<&BulkReport> for Outcome {
    fn from(report: &BulkReport) -> Self {
        if report.is_complete() {
            Self::Complete
        } else {
            Self::Partial
        }
    }
}

/// Print the resolved configuration; needs no session
pub(crate) fn show_config(config: &Config) -> ClientResult<Outcome> {
    let rendered =
        toml::to_string_pretty(config).map_err(|e| atrium_core::Error::Configuration {
            message: format!("Failed to serialize config: {e}"),
        })?;
    println!("{rendered}");
    Ok(Outcome::Complete)
}

/// Run one parsed command against the dashboard
pub(crate) async fn dispatch(dashboard: &Dashboard, command: Commands) -> ClientResult<Outcome> {
    match command {
        Commands::Login { email, password } => {
            let profile = dashboard.auth.login(&LoginRequest { email, password }).await?;
            println!("Logged in as {} ({})", profile.email, profile.role);
            Ok(Outcome::Complete)
        }
        Commands::Signup {
            name,
            email,
            password,
        } => {
            let request = SignupRequest {
                name,
                email,
                password,
            };
            let profile = dashboard.auth.signup(&request).await?;
            println!("Account created for {}", profile.email);
            Ok(Outcome::Complete)
        }
        Commands::Logout => {
            dashboard.auth.logout()?;
            println!("Logged out");
            Ok(Outcome::Complete)
        }
        Commands::Whoami { verify } => whoami(dashboard, verify).await,
        Commands::Events { action } => events(dashboard, action).await,
        Commands::Blogs { action } => blogs(dashboard, action).await,
        Commands::Users { action } => users(dashboard, action).await,
        Commands::Permissions { action } => permissions(dashboard, action).await,
        Commands::Config {
            action: ConfigCommands::Show,
        } => show_config(&dashboard.config),
    }
}

async fn whoami(dashboard: &Dashboard, verify: bool) -> ClientResult<Outcome> {
    let profile = if verify {
        dashboard.auth.verify().await?
    } else {
        dashboard.session.profile().ok_or_else(|| ClientError::Unauthenticated {
            message: "Not logged in. Run `atrium login` first.".to_string(),
        })?
    };
    println!("{} <{}>", profile.name, profile.email);
    println!("role: {}", profile.role);
    if !profile.permissions.is_empty() {
        let permissions: Vec<&str> = profile.permissions.iter().map(String::as_str).collect();
        println!("permissions: {}", permissions.join(", "));
    }
    Ok(Outcome::Complete)
}

fn print_json<T: Serialize>(value: &T) -> ClientResult<Outcome> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(Outcome::Complete)
}

/// Fetch a collection into a list state configured from `args`
async fn load<T, F>(dashboard: &Dashboard, args: &ListArgs, fetch: F) -> ClientResult<ListState<T>>
where
    T: Listable,
    F: Future<Output = ClientResult<Vec<T>>>,
{
    let mut state = dashboard.list_state::<T>();
    state.set_query(args.to_query(dashboard.config.view.page_size));
    state.begin_load();
    let records = fetch.await?;
    debug!(count = records.len(), "Collection loaded");
    state.finish_load(Ok::<_, ClientError>(records));
    Ok(state)
}

/// Apply `mode` to one id directly, or to several as a bulk operation
async fn remove<S, B, SF, BF>(
    mode: DeleteMode,
    ids: Vec<String>,
    single: S,
    bulk: B,
) -> ClientResult<Outcome>
where
    S: FnOnce(String) -> SF,
    SF: Future<Output = ClientResult<()>>,
    B: FnOnce(Vec<String>) -> BF,
    BF: Future<Output = BulkReport>,
{
    if let [id] = ids.as_slice() {
        single(id.clone()).await?;
        println!("{mode}: {id}");
        return Ok(Outcome::Complete);
    }
    let report = bulk(ids).await;
    println!("{}", output::bulk_summary(&mode.to_string(), &report));
    Ok(Outcome::from(&report))
}

const fn delete_mode(args: &RemoveArgs) -> DeleteMode {
    if args.hard {
        DeleteMode::Hard
    } else {
        DeleteMode::Soft
    }
}

async fn events(dashboard: &Dashboard, action: EventCommands) -> ClientResult<Outcome> {
    let client = &dashboard.events;
    match action {
        EventCommands::List(args) => {
            let state = load(dashboard, &args, client.list(args.deleted_filter())).await?;
            println!("{}", output::events_table(&state.view()));
            Ok(Outcome::Complete)
        }
        EventCommands::Show { id } => print_json(&client.get(&id).await?),
        EventCommands::Create(fields) => {
            let form = event_form(EventForm::default(), fields).await?;
            let event = client.create(&form).await?;
            println!("Created event {} ({})", event.id, event.title);
            Ok(Outcome::Complete)
        }
        EventCommands::Update { id, fields } => {
            let current = client.get(&id).await?;
            let form = event_form(event_form_from(current), fields).await?;
            let event = client.update(&id, &form).await?;
            println!("Updated event {}", event.id);
            Ok(Outcome::Complete)
        }
        EventCommands::Delete(args) => {
            let mode = delete_mode(&args);
            remove(
                mode,
                args.ids,
                |id| async move { client.apply(mode, &id).await },
                |ids| async move { client.bulk(mode, &ids).await },
            )
            .await
        }
        EventCommands::Restore(IdsArgs { ids }) => {
            remove(
                DeleteMode::Restore,
                ids,
                |id| async move { client.restore(&id).await },
                |ids| async move { client.bulk_restore(&ids).await },
            )
            .await
        }
    }
}

/// Editable form holding an existing event's values
fn event_form_from(event: Event) -> EventForm {
    EventForm {
        draft: EventDraft {
            title: event.title,
            description: event.description,
            category: event.category,
            location: event.location,
            start_date: event.start_date,
            end_date: event.end_date,
            status: Some(event.status),
            capacity: event.capacity,
            tags: event.tags,
            is_featured: event.is_featured,
        },
        images: Vec::new(),
        existing_images: event.images,
    }
}

/// Overlay the given flags onto `form` and read any image files
async fn event_form(mut form: EventForm, fields: EventArgs) -> ClientResult<EventForm> {
    let draft = &mut form.draft;
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(description) = fields.description {
        draft.description = description;
    }
    if fields.category.is_some() {
        draft.category = fields.category;
    }
    if fields.location.is_some() {
        draft.location = fields.location;
    }
    if fields.start.is_some() {
        draft.start_date = fields.start;
    }
    if fields.end.is_some() {
        draft.end_date = fields.end;
    }
    if fields.status.is_some() {
        draft.status = fields.status;
    }
    if fields.capacity.is_some() {
        draft.capacity = fields.capacity;
    }
    if !fields.tags.is_empty() {
        draft.tags = fields.tags;
    }
    if let Some(featured) = fields.featured {
        draft.is_featured = featured;
    }
    for path in fields.images {
        form.images.push(FilePart::from_path(path).await?);
    }
    Ok(form)
}

async fn blogs(dashboard: &Dashboard, action: BlogCommands) -> ClientResult<Outcome> {
    let client = &dashboard.blogs;
    match action {
        BlogCommands::List(args) => {
            let state = load(dashboard, &args, client.list(args.deleted_filter())).await?;
            println!("{}", output::blogs_table(&state.view()));
            Ok(Outcome::Complete)
        }
        BlogCommands::Show { id } => print_json(&client.get(&id).await?),
        BlogCommands::Create(fields) => {
            let form = blog_form(BlogForm::default(), fields).await?;
            let blog = client.create(&form).await?;
            println!("Created post {} at /{}", blog.id, blog.slug);
            Ok(Outcome::Complete)
        }
        BlogCommands::Update { id, fields } => {
            let current = client.get(&id).await?;
            let form = blog_form(BlogForm::new(blog_draft_from(current)), fields).await?;
            let blog = client.update(&id, &form).await?;
            println!("Updated post {}", blog.id);
            Ok(Outcome::Complete)
        }
        BlogCommands::Delete(args) => {
            let mode = delete_mode(&args);
            remove(
                mode,
                args.ids,
                |id| async move { client.apply(mode, &id).await },
                |ids| async move { client.bulk(mode, &ids).await },
            )
            .await
        }
        BlogCommands::Restore(IdsArgs { ids }) => {
            remove(
                DeleteMode::Restore,
                ids,
                |id| async move { client.restore(&id).await },
                |ids| async move { client.bulk_restore(&ids).await },
            )
            .await
        }
        BlogCommands::Slug { title } => {
            println!("{}", slugify(&title));
            Ok(Outcome::Complete)
        }
    }
}

/// Editable draft holding an existing post's values
fn blog_draft_from(blog: Blog) -> BlogDraft {
    BlogDraft {
        title: blog.title,
        slug: Some(blog.slug),
        content: blog.content,
        excerpt: blog.excerpt,
        category: blog.category,
        tags: blog.tags,
        status: Some(blog.status),
        is_featured: blog.is_featured,
    }
}

/// Overlay the given flags onto `form` and read any files
async fn blog_form(mut form: BlogForm, fields: BlogArgs) -> ClientResult<BlogForm> {
    let draft = &mut form.draft;
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if fields.slug.is_some() {
        draft.slug = fields.slug;
    }
    if let Some(content) = fields.content {
        draft.content = content;
    }
    if let Some(path) = fields.content_file {
        draft.content = tokio::fs::read_to_string(&path).await.map_err(|err| {
            ClientError::validation("content", format!("cannot read {}: {err}", path.display()))
        })?;
    }
    if fields.excerpt.is_some() {
        draft.excerpt = fields.excerpt;
    }
    if fields.category.is_some() {
        draft.category = fields.category;
    }
    if !fields.tags.is_empty() {
        draft.tags = fields.tags;
    }
    if fields.status.is_some() {
        draft.status = fields.status;
    }
    if let Some(featured) = fields.featured {
        draft.is_featured = featured;
    }
    if let Some(path) = fields.cover {
        form.cover_image = Some(FilePart::from_path(path).await?);
    }
    Ok(form)
}

async fn users(dashboard: &Dashboard, action: UserCommands) -> ClientResult<Outcome> {
    let client = &dashboard.users;
    match action {
        UserCommands::List(args) => {
            let state = load(dashboard, &args, client.list(args.deleted_filter())).await?;
            println!("{}", output::users_table(&state.view()));
            Ok(Outcome::Complete)
        }
        UserCommands::Show { id } => print_json(&client.get(&id).await?),
        UserCommands::Update {
            id,
            name,
            role,
            active,
        } => {
            let update = UserUpdate {
                name,
                role,
                is_active: active,
            };
            let user = client.update(&id, &update).await?;
            println!(
                "Updated {} ({}, {})",
                user.profile.email,
                user.profile.role,
                if user.profile.is_active { "active" } else { "inactive" }
            );
            Ok(Outcome::Complete)
        }
        UserCommands::Delete(args) => {
            let mode = delete_mode(&args);
            remove(
                mode,
                args.ids,
                |id| async move { client.apply(mode, &id).await },
                |ids| async move { client.bulk(mode, &ids).await },
            )
            .await
        }
        UserCommands::Restore(IdsArgs { ids }) => {
            remove(
                DeleteMode::Restore,
                ids,
                |id| async move { client.restore(&id).await },
                |ids| async move { client.bulk_restore(&ids).await },
            )
            .await
        }
    }
}

async fn permissions(dashboard: &Dashboard, action: PermissionCommands) -> ClientResult<Outcome> {
    let client = &dashboard.permissions;
    match action {
        PermissionCommands::Catalog => {
            for permission in client.catalog().await? {
                match permission.description {
                    Some(description) => println!("{:<28} {description}", permission.name),
                    None => println!("{}", permission.name),
                }
            }
        }
        PermissionCommands::Show { user } => {
            for permission in client.for_user(&user).await? {
                println!("{permission}");
            }
        }
        PermissionCommands::Grant { user, permission } => {
            let held = client.grant(&user, &permission).await?;
            println!("{user} now holds {} permission(s)", held.len());
        }
        PermissionCommands::Revoke { user, permission } => {
            let held = client.revoke(&user, &permission).await?;
            println!("{user} now holds {} permission(s)", held.len());
        }
    }
    Ok(Outcome::Complete)
}
