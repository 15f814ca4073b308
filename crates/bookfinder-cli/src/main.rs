mod output;

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use bookfinder_catalog::{
    CatalogSource, OpenLibraryCatalog, Recommender, SearchOutcome, SearchSession, Suggester,
};
use bookfinder_core::{
    Accounts, AppConfig, BookRecord, CoreError, CoverSize, DiscussionComment, DocumentStore,
    FilterOptions, GoalKind, ProfileUpdate, ProgressUpdate, ReadingGoal, ReadingStatus,
    SearchHistory, SearchKind, SharePlatform, SignupForm, SortBy, Theme, UserData, UserDataStore,
    UserProfile, image_mime_for_extension, names, photo_data_url, share_text, share_url,
};

use output::{CliError, Output, classify};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bookfinder",
    about = "Find books in Open Library and keep track of your reading",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BOOKFINDER_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// title, author, subject, isbn or general.
        #[arg(long)]
        kind: Option<SearchKind>,
        #[arg(long)]
        year_from: Option<i32>,
        #[arg(long)]
        year_to: Option<i32>,
        /// Language code, e.g. `eng`.
        #[arg(long)]
        language: Option<String>,
        /// Keep books with a subject containing this text.
        #[arg(long)]
        subject: Option<String>,
        /// relevance, newest, oldest, title or rating.
        #[arg(long)]
        sort: Option<SortBy>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Type-ahead suggestions for partial input.
    Suggest {
        input: String,
        #[arg(long)]
        kind: Option<SearchKind>,
    },

    /// Show a book and add it to recently viewed.
    View {
        key: String,
        /// Cover size: S, M or L.
        #[arg(long)]
        cover: Option<CoverSize>,
    },

    /// Save a book.
    Save { key: String },

    /// Remove a book from saved books.
    Unsave { key: String },

    /// List saved books.
    Saved,

    /// Rate a book from 1 to 5.
    Rate { key: String, rating: u8 },

    /// Reading lists.
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Reading progress.
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Recently viewed books, most recent first.
    Recent,

    /// Yearly reading goal.
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Reading statistics.
    Stats,

    /// Comments on a book.
    Discuss {
        #[command(subcommand)]
        action: DiscussAction,
    },

    /// Write reading lists and saved books to a JSON file.
    Export {
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Search history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// The local user profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show or switch the color theme. Toggles when no value is given.
    Theme { value: Option<Theme> },

    /// Open or close the sidebar. Toggles when no value is given.
    Sidebar { state: Option<SidebarState> },

    /// Create an account. Passwords not given as flags are read from stdin.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Sign in to an existing account.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Books picked from the subjects of your saved and listed books.
    Recommend,

    /// Share text and links for a book.
    Share {
        key: String,
        #[arg(long)]
        platform: Option<SharePlatform>,
        /// Link to share instead of the Open Library page.
        #[arg(long)]
        url: Option<String>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ListAction {
    /// List all reading lists.
    Ls,
    /// Create a reading list.
    Create { name: String },
    /// Add a book to a list.
    Add { list_id: String, key: String },
    /// Remove a book from a list.
    Remove { list_id: String, key: String },
    /// Delete a list.
    Delete { list_id: String },
    /// Show the books in a list.
    Show { list_id: String },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Update progress; omitted fields keep their value.
    Set {
        key: String,
        #[arg(long)]
        current: Option<u32>,
        #[arg(long)]
        total: Option<u32>,
        /// want-to-read, reading, paused or completed.
        #[arg(long)]
        status: Option<ReadingStatus>,
    },
    /// Show progress for a book.
    Show { key: String },
}

#[derive(Subcommand)]
enum GoalAction {
    /// Set the goal for the current year.
    Set {
        #[arg(long, default_value = "0")]
        books: u32,
        #[arg(long, default_value = "0")]
        pages: u32,
        /// yearly or monthly.
        #[arg(long, default_value = "yearly")]
        kind: GoalKind,
    },
    /// Show a goal and how far along it is.
    Show {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
enum DiscussAction {
    /// Add a comment as the current profile.
    Add { key: String, comment: String },
    /// Show comments in the order they were written.
    Show { key: String },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show recent searches.
    Show,
    /// Forget all searches.
    Clear,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the profile.
    Show,
    /// Update profile fields.
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Image file to use as the profile picture.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Sign out and forget the profile.
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    Show,
    /// Print the config file path.
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum SidebarState {
    Open,
    Closed,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let start = Instant::now();
    let cli = Cli::parse();

    // ── Env var overrides ──────────────────────────────────────────────────
    let json_output = cli.json || std::env::var("BOOKFINDER_JSON").as_deref() == Ok("1");
    let out = Output::new(json_output, start);

    if let Err(err) = run(cli.command, &out).await {
        let failure = classify(&err);
        tracing::debug!(error = %format!("{err:#}"), code = failure.code, "command failed");
        out.error(&failure);
        std::process::exit(failure.code);
    }
}

async fn run(command: Commands, out: &Output) -> Result<()> {
    // Load config (honors BOOKFINDER_CONFIG and BOOKFINDER_DATA_DIR)
    let mut config = AppConfig::load()?;
    if let Ok(dir) = std::env::var("BOOKFINDER_DATA_DIR") {
        config.set_data_dir(dir.into());
    }
    let docs = config.documents();

    match command {
        // ── Catalog ────────────────────────────────────────────────────────

        Commands::Search { query, kind, year_from, year_to, language, subject, sort, limit } => {
            let query = query.join(" ");
            let kind = kind.unwrap_or(config.ui.default_search_kind);
            let store = UserDataStore::open(&docs)?;
            let ratings = &store.data().ratings;

            let session = SearchSession::new(
                open_catalog(&config)?,
                limit.unwrap_or(config.catalog.search_limit),
            );
            session.set_filters(
                FilterOptions {
                    year_from,
                    year_to,
                    language,
                    subject_contains: subject,
                    sort_by: sort.unwrap_or_default(),
                },
                ratings,
            );

            record_search(&docs, &query, kind)?;
            if let SearchOutcome::Skipped = session.search(&query, kind, ratings).await? {
                return Err(CliError::InvalidArgs("Search query is empty".into()).into());
            }

            let state = session.state();
            if out.json {
                out.ok(json!({
                    "items": state.books,
                    "total": state.all_books.len(),
                    "shown": state.books.len(),
                    "query": query,
                    "kind": kind,
                    "filters": state.filters,
                }))?;
            } else if state.books.is_empty() {
                println!("No books found for: {query}");
            } else {
                println!("Found {} results ({} shown):", state.all_books.len(), state.books.len());
                for book in &state.books {
                    println!("  {}", book_line(book, store.data()));
                }
            }
        }

        Commands::Suggest { input, kind } => {
            let kind = kind.unwrap_or(config.ui.default_search_kind);
            let suggester = Suggester::new(open_catalog(&config)?, &config.catalog);
            let suggestions = suggester.suggest(&input, kind).await.unwrap_or_default();
            if out.json {
                out.ok(json!({ "input": input, "kind": kind, "suggestions": suggestions }))?;
            } else {
                for s in &suggestions {
                    println!("{s}");
                }
            }
        }

        Commands::View { key, cover } => {
            let key = normalize_key(&key);
            let mut store = UserDataStore::open(&docs)?;
            let book = resolve_book(&key, store.data(), &config).await?;
            store.add_to_recently_viewed(book.clone())?;

            let data = store.data();
            let size = cover.unwrap_or(config.ui.default_cover_size);
            let cover_url = book.cover_url(&config.catalog.covers_url, size);
            let rating = data.rating(&key);
            let progress = data.progress(&key);
            let comments = data.discussions(&key);

            if out.json {
                out.ok(json!({
                    "book": book,
                    "cover_url": cover_url,
                    "rating": rating,
                    "saved": data.is_saved(&key),
                    "progress": progress,
                    "discussions": comments,
                }))?;
            } else {
                println!("{}", book.title);
                println!("  by {}", book.display_authors());
                if let Some(year) = book.first_publish_year {
                    println!("  First published: {year}");
                }
                if !book.subject.is_empty() {
                    let shown: Vec<&str> = book.subject.iter().take(5).map(String::as_str).collect();
                    println!("  Subjects: {}", shown.join(", "));
                }
                if let Some(url) = cover_url {
                    println!("  Cover: {url}");
                }
                println!("  Key: {}", book.key);
                if rating > 0 {
                    println!("  Your rating: {}", stars(rating));
                }
                if data.is_saved(&key) {
                    println!("  Saved");
                }
                if let Some(p) = progress {
                    println!(
                        "  {}: page {}/{} ({}%)",
                        p.status.label(),
                        p.current_page,
                        p.total_pages,
                        p.percentage
                    );
                }
                if !comments.is_empty() {
                    println!("  {} comments", comments.len());
                }
            }
        }

        // ── Saved books & ratings ──────────────────────────────────────────

        Commands::Save { key } => {
            let key = normalize_key(&key);
            let mut store = UserDataStore::open(&docs)?;
            let book = resolve_book(&key, store.data(), &config).await?;
            let title = book.title.clone();
            store.save(book)?;
            if out.json {
                out.ok(json!({ "saved": key, "total": store.data().saved_books.len() }))?;
            } else {
                println!("Saved: {title}");
            }
        }

        Commands::Unsave { key } => {
            let key = normalize_key(&key);
            let mut store = UserDataStore::open(&docs)?;
            if !store.data().is_saved(&key) {
                return Err(CliError::NotFound(format!("Book {key} is not saved")).into());
            }
            store.unsave(&key)?;
            if out.json {
                out.ok(json!({ "removed": key }))?;
            } else {
                println!("Removed from saved books: {key}");
            }
        }

        Commands::Saved => {
            let store = UserDataStore::open(&docs)?;
            let saved = store.data().saved_books();
            if out.json {
                out.ok(json!({ "items": saved, "total": saved.len() }))?;
            } else if saved.is_empty() {
                println!("No saved books. Use `bookfinder save <key>` to save one.");
            } else {
                for s in saved {
                    println!("  {}", book_line(&s.book, store.data()));
                }
            }
        }

        Commands::Rate { key, rating } => {
            let key = normalize_key(&key);
            let mut store = UserDataStore::open(&docs)?;
            store.rate(&key, rating)?;
            if out.json {
                out.ok(json!({ "key": key, "rating": rating }))?;
            } else {
                println!("Rated {key}: {}", stars(rating));
            }
        }

        // ── Reading lists ──────────────────────────────────────────────────

        Commands::List { action } => {
            let mut store = UserDataStore::open(&docs)?;
            match action {
                ListAction::Ls => {
                    let lists = store.data().lists_by_creation();
                    if out.json {
                        out.ok(json!({ "items": lists, "total": lists.len() }))?;
                    } else if lists.is_empty() {
                        println!("No reading lists. Use `bookfinder list create <name>`.");
                    } else {
                        for list in lists {
                            println!("{}  {:<30}  {} books", list.id, list.name, list.books.len());
                        }
                    }
                }
                ListAction::Create { name } => {
                    let id = store.create_list(&name)?;
                    if out.json {
                        out.ok(json!({ "id": id, "name": name.trim() }))?;
                    } else {
                        println!("Created list '{}' ({id})", name.trim());
                    }
                }
                ListAction::Add { list_id, key } => {
                    let key = normalize_key(&key);
                    let book = resolve_book(&key, store.data(), &config).await?;
                    let title = book.title.clone();
                    store.add_to_list(&list_id, book)?;
                    if out.json {
                        out.ok(json!({ "list": list_id, "added": key }))?;
                    } else {
                        println!("Added '{title}' to list {list_id}");
                    }
                }
                ListAction::Remove { list_id, key } => {
                    let key = normalize_key(&key);
                    store.remove_from_list(&list_id, &key)?;
                    if out.json {
                        out.ok(json!({ "list": list_id, "removed": key }))?;
                    } else {
                        println!("Removed {key} from list {list_id}");
                    }
                }
                ListAction::Delete { list_id } => {
                    let list = store.delete_list(&list_id)?;
                    if out.json {
                        out.ok(json!({ "deleted": list.id, "name": list.name }))?;
                    } else {
                        println!("Deleted list '{}'", list.name);
                    }
                }
                ListAction::Show { list_id } => {
                    let data = store.data();
                    let list = data
                        .list(&list_id)
                        .ok_or_else(|| CoreError::ListNotFound(list_id.clone()))?;
                    if out.json {
                        out.ok(serde_json::to_value(list)?)?;
                    } else {
                        println!("{} ({} books)", list.name, list.books.len());
                        for book in &list.books {
                            println!("  {}", book_line(book, data));
                        }
                    }
                }
            }
        }

        // ── Progress & recently viewed ─────────────────────────────────────

        Commands::Progress { action } => {
            let mut store = UserDataStore::open(&docs)?;
            match action {
                ProgressAction::Set { key, current, total, status } => {
                    let key = normalize_key(&key);
                    if current.is_none() && total.is_none() && status.is_none() {
                        return Err(CliError::InvalidArgs(
                            "Give at least one of --current, --total or --status".into(),
                        )
                        .into());
                    }
                    let progress = store.update_progress(
                        &key,
                        ProgressUpdate { current_page: current, total_pages: total, status },
                    )?;
                    if out.json {
                        out.ok(json!({ "key": key, "progress": progress }))?;
                    } else {
                        println!(
                            "{}: page {}/{} ({}%)",
                            progress.status.label(),
                            progress.current_page,
                            progress.total_pages,
                            progress.percentage
                        );
                    }
                }
                ProgressAction::Show { key } => {
                    let key = normalize_key(&key);
                    let progress = store
                        .data()
                        .progress(&key)
                        .ok_or_else(|| CliError::NotFound(format!("No progress recorded for {key}")))?;
                    if out.json {
                        out.ok(json!({ "key": key, "progress": progress }))?;
                    } else {
                        println!(
                            "{}: page {}/{} ({}%), updated {}",
                            progress.status.label(),
                            progress.current_page,
                            progress.total_pages,
                            progress.percentage,
                            progress.last_updated.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }

        Commands::Recent => {
            let store = UserDataStore::open(&docs)?;
            let recent = store.data().recently_viewed();
            if out.json {
                out.ok(json!({ "items": recent, "total": recent.len() }))?;
            } else if recent.is_empty() {
                println!("Nothing viewed yet.");
            } else {
                for book in recent {
                    println!("  {}", book_line(book, store.data()));
                }
            }
        }

        // ── Goals & stats ──────────────────────────────────────────────────

        Commands::Goal { action } => {
            let mut store = UserDataStore::open(&docs)?;
            match action {
                GoalAction::Set { books, pages, kind } => {
                    let goal = ReadingGoal::for_current_year(kind, books, pages);
                    let year = goal.year;
                    store.set_goal(goal)?;
                    let progress = store.data().goal_progress(year);
                    if out.json {
                        out.ok(json!({ "goal": store.data().goal(year), "progress": progress }))?;
                    } else {
                        println!("Goal for {year}: {books} books, {pages} pages");
                    }
                }
                GoalAction::Show { year } => {
                    let year = year.unwrap_or_else(|| chrono::Utc::now().year());
                    let data = store.data();
                    let goal = data
                        .goal(year)
                        .ok_or_else(|| CliError::NotFound(format!("No reading goal for {year}")))?;
                    let progress = data.goal_progress(year);
                    if out.json {
                        out.ok(json!({ "goal": goal, "progress": progress }))?;
                    } else if let Some(p) = progress {
                        println!("{} goal for {year}", goal.kind);
                        println!(
                            "  Books: {}/{} ({}%)",
                            p.books_done, p.target_books, p.books_percent
                        );
                        println!(
                            "  Pages: {}/{} ({}%)",
                            p.pages_done, p.target_pages, p.pages_percent
                        );
                    }
                }
            }
        }

        Commands::Stats => {
            let store = UserDataStore::open(&docs)?;
            let data = store.data();
            let stats = data.reading_stats();
            if out.json {
                out.ok(json!({
                    "stats": stats,
                    "saved_books": data.saved_books.len(),
                    "reading_lists": data.reading_lists.len(),
                    "rated_books": data.ratings.len(),
                }))?;
            } else {
                println!("Reading statistics:");
                println!("  Books completed:  {}", stats.books_completed);
                println!("  Currently reading: {}", stats.books_reading);
                println!("  Pages read:       {}", stats.pages_read);
                println!("  Pages finished:   {}", stats.pages_completed);
                println!("  Average rating:   {:.1}", stats.average_rating);
                println!("  Saved books:      {}", data.saved_books.len());
                println!("  Reading lists:    {}", data.reading_lists.len());
            }
        }

        // ── Discussions ────────────────────────────────────────────────────

        Commands::Discuss { action } => {
            let mut store = UserDataStore::open(&docs)?;
            match action {
                DiscussAction::Add { key, comment } => {
                    let key = normalize_key(&key);
                    let comment = comment.trim().to_string();
                    if comment.is_empty() {
                        return Err(CliError::InvalidArgs("Comment is empty".into()).into());
                    }
                    let profile: UserProfile = docs.load(names::PROFILE)?;
                    let entry = DiscussionComment::new(comment, profile.display_name());
                    store.add_discussion_comment(&key, entry)?;
                    let total = store.data().discussions(&key).len();
                    if out.json {
                        out.ok(json!({ "key": key, "total": total }))?;
                    } else {
                        println!("Comment added ({total} total).");
                    }
                }
                DiscussAction::Show { key } => {
                    let key = normalize_key(&key);
                    let comments = store.data().discussions(&key);
                    if out.json {
                        out.ok(json!({ "key": key, "items": comments }))?;
                    } else if comments.is_empty() {
                        println!("No comments yet.");
                    } else {
                        for c in comments {
                            println!("[{}] {}: {}", c.timestamp.format("%Y-%m-%d %H:%M"), c.user, c.comment);
                        }
                    }
                }
            }
        }

        // ── Export ─────────────────────────────────────────────────────────

        Commands::Export { dir } => {
            let store = UserDataStore::open(&docs)?;
            let snapshot = store.data().export_snapshot();
            let path = snapshot.write_to_dir(&dir)?;
            if out.json {
                out.ok(json!({
                    "path": path.to_string_lossy(),
                    "reading_lists": snapshot.reading_lists.len(),
                    "saved_books": snapshot.saved_books.len(),
                }))?;
            } else {
                println!("Exported to {}", path.display());
            }
        }

        // ── History & preferences ──────────────────────────────────────────

        Commands::History { action } => {
            let mut history = docs.open::<SearchHistory>(names::SEARCH_HISTORY)?;
            match action {
                HistoryAction::Show => {
                    let entries = history.get().entries();
                    if out.json {
                        out.ok(json!({ "items": entries, "total": entries.len() }))?;
                    } else if entries.is_empty() {
                        println!("No recent searches.");
                    } else {
                        for e in entries {
                            println!("  {}  {:<8}  {}", e.date, e.kind.to_string(), e.query);
                        }
                    }
                }
                HistoryAction::Clear => {
                    history.update(|h| h.clear())?;
                    if out.json {
                        out.ok(json!({ "cleared": true }))?;
                    } else {
                        println!("Search history cleared.");
                    }
                }
            }
        }

        Commands::Profile { action } => {
            let mut profile = docs.open::<UserProfile>(names::PROFILE)?;
            match action {
                ProfileAction::Show => {
                    let p = profile.get();
                    if out.json {
                        out.ok(json!({ "profile": p, "signed_in": p.is_signed_in() }))?;
                    } else {
                        println!("Name:  {}", p.display_name());
                        println!("Email: {}", if p.email.is_empty() { "-" } else { p.email.as_str() });
                        println!("Photo: {}", if p.photo.is_empty() { "none" } else { "set" });
                    }
                }
                ProfileAction::Set { name, email, photo } => {
                    let photo = photo.as_deref().map(read_photo).transpose()?;
                    let update = ProfileUpdate { name, email, photo };
                    profile.update(|p| p.apply(update))?;
                    if out.json {
                        out.ok(json!({ "profile": profile.get() }))?;
                    } else {
                        println!("Profile updated: {}", profile.get().display_name());
                    }
                }
                ProfileAction::Clear => {
                    docs.remove(names::PROFILE)?;
                    if out.json {
                        out.ok(json!({ "cleared": true }))?;
                    } else {
                        println!("Signed out.");
                    }
                }
            }
        }

        Commands::Theme { value } => {
            let mut theme = docs.open::<Theme>(names::THEME)?;
            let next = theme.update(|t| {
                let next = value.unwrap_or(t.toggled());
                *t = next;
                next
            })?;
            if out.json {
                out.ok(json!({ "theme": next }))?;
            } else {
                println!("Theme: {next}");
            }
        }

        Commands::Sidebar { state } => {
            let mut sidebar = docs.open::<bool>(names::SIDEBAR)?;
            let open = sidebar.update(|open| {
                *open = match state {
                    Some(SidebarState::Open) => true,
                    Some(SidebarState::Closed) => false,
                    None => !*open,
                };
                *open
            })?;
            if out.json {
                out.ok(json!({ "open": open }))?;
            } else {
                println!("Sidebar {}", if open { "open" } else { "closed" });
            }
        }

        // ── Accounts ───────────────────────────────────────────────────────

        Commands::Signup { name, email, password, confirm } => {
            let password = secret_arg(password, "Password")?;
            let confirm_password = secret_arg(confirm, "Confirm password")?;
            let form = SignupForm { full_name: name, email, password, confirm_password };

            let mut accounts: Accounts = docs.load(names::ACCOUNTS)?;
            let account = accounts.signup(&form)?;
            docs.save(names::ACCOUNTS, &accounts)?;
            sign_in(&docs, account.profile_update())?;
            if out.json {
                out.ok(json!({ "profile": account.profile() }))?;
            } else {
                println!("Welcome, {}!", account.name);
            }
        }

        Commands::Login { email, password } => {
            let password = secret_arg(password, "Password")?;
            let accounts: Accounts = docs.load(names::ACCOUNTS)?;
            let account = accounts.login(&email, &password)?;
            sign_in(&docs, account.profile_update())?;
            if out.json {
                out.ok(json!({ "profile": account.profile() }))?;
            } else {
                println!("Signed in as {}", account.name);
            }
        }

        // ── Recommendations & sharing ──────────────────────────────────────

        Commands::Recommend => {
            let store = UserDataStore::open(&docs)?;
            let recommender = Recommender::new(open_catalog(&config)?, config.recommendations.clone());
            let books = recommender.recommend(store.data()).await?;
            if out.json {
                out.ok(json!({
                    "items": books,
                    "total": books.len(),
                    "personalized": !store.data().collected_books().is_empty(),
                }))?;
            } else if books.is_empty() {
                println!("No recommendations right now.");
            } else {
                println!("Recommended for you:");
                for book in &books {
                    println!("  {}", book_line(book, store.data()));
                }
            }
        }

        Commands::Share { key, platform, url } => {
            let key = normalize_key(&key);
            let store = UserDataStore::open(&docs)?;
            let book = resolve_book(&key, store.data(), &config).await?;
            let url = url.unwrap_or_else(|| {
                format!("{}{}", config.catalog.base_url.trim_end_matches('/'), book.key)
            });
            let platforms: Vec<SharePlatform> = match platform {
                Some(p) => vec![p],
                None => SharePlatform::ALL.to_vec(),
            };
            let links: BTreeMap<String, String> = platforms
                .iter()
                .map(|p| (p.to_string(), share_url(*p, &book, &url)))
                .collect();
            let text = share_text(&book);
            if out.json {
                out.ok(json!({ "text": text, "url": url, "links": links }))?;
            } else {
                println!("{text}");
                for (platform, link) in &links {
                    println!("  {platform:<9} {link}");
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let kv = config_key_values(&config);
                if out.json {
                    out.ok(json!(kv))?;
                } else {
                    for (k, v) in &kv {
                        println!("{k} = {v}");
                    }
                }
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if out.json {
                    out.ok(json!({ "path": path.to_string_lossy(), "exists": path.exists() }))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn open_catalog(config: &AppConfig) -> Result<Arc<dyn CatalogSource>> {
    Ok(Arc::new(OpenLibraryCatalog::new(&config.catalog)?))
}

/// Accept bare work ids (`OL27482W`) as well as full keys (`/works/OL27482W`).
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with('/') {
        key.to_string()
    } else {
        format!("/works/{key}")
    }
}

/// A book the user already has a snapshot of, from any collection.
fn find_local<'a>(data: &'a UserData, key: &str) -> Option<&'a BookRecord> {
    data.collected_books()
        .into_iter()
        .find(|b| b.key == key)
        .or_else(|| data.recently_viewed().iter().find(|b| b.key == key))
}

/// Local snapshot first, then the catalog.
async fn resolve_book(key: &str, data: &UserData, config: &AppConfig) -> Result<BookRecord> {
    if let Some(book) = find_local(data, key) {
        return Ok(book.clone());
    }
    let catalog = open_catalog(config)?;
    match catalog.lookup(key).await? {
        Some(book) => Ok(book),
        None => Err(CliError::NotFound(format!("Book {key} not found")).into()),
    }
}

fn book_line(book: &BookRecord, data: &UserData) -> String {
    let year = book.first_publish_year.map(|y| y.to_string()).unwrap_or_default();
    let saved = if data.is_saved(&book.key) { "*" } else { " " };
    let rating = match data.rating(&book.key) {
        0 => String::new(),
        r => stars(r),
    };
    format!(
        "{saved} {key:<22}  {title:<40}  {authors:<25}  {year:>4}  {rating}",
        key = book.key,
        title = truncate(&book.title, 40),
        authors = truncate(&book.display_authors(), 25),
    )
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn read_photo(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    Ok(photo_data_url(&bytes, image_mime_for_extension(ext)))
}

/// Use the flag value, or read one line from stdin.
fn secret_arg(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    eprint!("{prompt}: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn sign_in(docs: &DocumentStore, update: ProfileUpdate) -> Result<()> {
    let mut profile = docs.open::<UserProfile>(names::PROFILE)?;
    profile.update(|p| p.apply(update))?;
    Ok(())
}

/// Add a non-blank search to the history before it is fetched, so failed
/// searches are listed too. Returns whether anything was recorded.
fn record_search(docs: &DocumentStore, query: &str, kind: SearchKind) -> Result<bool> {
    let term = query.trim();
    if term.is_empty() {
        return Ok(false);
    }
    docs.open::<SearchHistory>(names::SEARCH_HISTORY)?
        .update(|h| h.record(term, kind))?;
    Ok(true)
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("core.data_dir", config.data_dir().to_string_lossy().to_string());
    map.insert("catalog.base_url", config.catalog.base_url.clone());
    map.insert("catalog.covers_url", config.catalog.covers_url.clone());
    map.insert("catalog.search_limit", config.catalog.search_limit.to_string());
    map.insert("catalog.suggestion_limit", config.catalog.suggestion_limit.to_string());
    map.insert(
        "catalog.suggestion_debounce_ms",
        config.catalog.suggestion_debounce_ms.to_string(),
    );
    map.insert(
        "catalog.suggestion_min_chars",
        config.catalog.suggestion_min_chars.to_string(),
    );
    map.insert("recommendations.max_subjects", config.recommendations.max_subjects.to_string());
    map.insert(
        "recommendations.per_subject_limit",
        config.recommendations.per_subject_limit.to_string(),
    );
    map.insert("recommendations.max_results", config.recommendations.max_results.to_string());
    map.insert("recommendations.fallback_query", config.recommendations.fallback_query.clone());
    map.insert("ui.default_search_kind", config.ui.default_search_kind.to_string());
    map.insert("ui.default_cover_size", config.ui.default_cover_size.to_string());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_filters() {
        let cli = Cli::try_parse_from([
            "bookfinder", "search", "the", "hobbit", "--kind", "title", "--year-from", "1930",
            "--sort", "newest", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Search { query, kind, year_from, sort, .. } => {
                assert_eq!(query.join(" "), "the hobbit");
                assert_eq!(kind, Some(SearchKind::Title));
                assert_eq!(year_from, Some(1930));
                assert_eq!(sort, Some(SortBy::Newest));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_bad_status_is_rejected_by_parser() {
        let res = Cli::try_parse_from(["bookfinder", "progress", "set", "OL1W", "--status", "done"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("OL27482W"), "/works/OL27482W");
        assert_eq!(normalize_key(" /works/OL1W "), "/works/OL1W");
        assert_eq!(normalize_key("/books/OL2M"), "/books/OL2M");
    }

    #[test]
    fn test_find_local_checks_every_collection() {
        let mut data = UserData::default();
        data.save(BookRecord::new("/works/A", "Saved"));
        let list = data.create_list("Later").unwrap();
        data.add_to_list(&list, BookRecord::new("/works/B", "Listed")).unwrap();
        data.add_to_recently_viewed(BookRecord::new("/works/C", "Viewed"));

        assert_eq!(find_local(&data, "/works/A").unwrap().title, "Saved");
        assert_eq!(find_local(&data, "/works/B").unwrap().title, "Listed");
        assert_eq!(find_local(&data, "/works/C").unwrap().title, "Viewed");
        assert!(find_local(&data, "/works/D").is_none());
    }

    #[test]
    fn test_stars_and_truncate() {
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn test_read_photo_builds_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert_eq!(read_photo(&path).unwrap(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_record_search_trims_and_skips_blank() {
        let dir = tempfile::tempdir().unwrap();
        let docs = DocumentStore::new(dir.path());
        assert!(!record_search(&docs, "   ", SearchKind::Title).unwrap());
        assert!(!docs.exists(names::SEARCH_HISTORY));

        assert!(record_search(&docs, "  dune  ", SearchKind::Title).unwrap());
        let history: SearchHistory = docs.load(names::SEARCH_HISTORY).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].query, "dune");
    }
}
