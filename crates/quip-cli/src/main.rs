//! Quip CLI - browse, grow, and sync a quote collection from the terminal.

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use quip_core::export::suggested_export_file_name;
use quip_core::remote::{HttpRemote, DEFAULT_BASE_URL};
use quip_core::store::{MemoryKeyValueStore, SessionState, SqliteKeyValueStore};
use quip_core::{Conflict, Quote, QuoteBook, Resolution, SyncEngine};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "quip")]
#[command(about = "Offline-first quote manager that syncs with a remote source")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one random quote
    Show {
        /// Restrict the pool to one category
        #[arg(long)]
        category: Option<String>,
    },
    /// Browse quotes interactively
    Browse,
    /// Add a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text
        text: Vec<String>,
        /// Category for the quote
        #[arg(short, long)]
        category: String,
    },
    /// List quotes, filtered by the remembered or given category
    List {
        /// Filter by category (remembered for next time)
        #[arg(long)]
        category: Option<String>,
        /// Ignore the remembered filter and list everything
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List distinct categories
    Categories,
    /// Import quotes from a JSON file
    Import {
        /// Path to a JSON array of quotes
        file: PathBuf,
    },
    /// Export the full collection as JSON
    Export {
        /// Output path; bare `--output` picks a dated default name
        #[arg(short, long, value_name = "PATH", num_args = 0..=1)]
        output: Option<Option<PathBuf>>,
    },
    /// Sync with the remote source
    Sync {
        /// Keep syncing on a fixed interval
        #[arg(long)]
        watch: bool,
        /// Seconds between cycles in watch mode
        #[arg(long, default_value = "30")]
        interval: u64,
        /// Resolve all conflicts one way instead of prompting
        #[arg(long, value_enum)]
        resolve: Option<ResolveChoice>,
    },
    /// Restore the seed default quotes
    Reset,
    /// Clear persisted quotes and preferences
    Clear,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ResolveChoice {
    Local,
    Server,
}

impl From<ResolveChoice> for Resolution {
    fn from(choice: ResolveChoice) -> Self {
        match choice {
            ResolveChoice::Local => Self::Local,
            ResolveChoice::Server => Self::Server,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] quip_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quotes available for this category.")]
    EmptyPool,
    #[error("Quote text cannot be empty")]
    EmptyText,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quip=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Show { category } => run_show(category.as_deref(), &db_path),
        Commands::Browse => run_browse(&db_path),
        Commands::Add { text, category } => run_add(&text, &category, &db_path),
        Commands::List {
            category,
            all,
            json,
        } => run_list(category.as_deref(), all, json, &db_path),
        Commands::Categories => run_categories(&db_path),
        Commands::Import { file } => run_import(&file, &db_path),
        Commands::Export { output } => run_export(output, &db_path),
        Commands::Sync {
            watch,
            interval,
            resolve,
        } => run_sync(watch, interval, resolve.map(Resolution::from), &db_path).await,
        Commands::Reset => run_reset(&db_path),
        Commands::Clear => run_clear(&db_path),
    }
}

fn run_show(category: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path)?;
    let quote = book.pick_random(category).ok_or(CliError::EmptyPool)?;
    print_quote(quote);
    Ok(())
}

/// Interactive browser: enter for another quote, `c <name>` to switch
/// category, `q` to quit. The last shown quote and category live in
/// session-scoped state for the duration of the run.
fn run_browse(db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path)?;
    let mut session = SessionState::new(MemoryKeyValueStore::new());

    show_random(&book, &mut session)?;

    let stdin = io::stdin();
    loop {
        print!("[enter] next  [c <category>] filter  [q] quit > ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_browse_action(&line) {
            BrowseAction::Next => show_random(&book, &mut session)?,
            BrowseAction::Filter(category) => {
                session.set_last_category(&category)?;
                show_random(&book, &mut session)?;
            }
            BrowseAction::AllCategories => {
                session.set_last_category("all")?;
                show_random(&book, &mut session)?;
            }
            BrowseAction::Quit => break,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum BrowseAction {
    Next,
    Filter(String),
    AllCategories,
    Quit,
}

fn parse_browse_action(line: &str) -> BrowseAction {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return BrowseAction::Quit;
    }
    if let Some(category) = trimmed
        .strip_prefix("c ")
        .or_else(|| trimmed.strip_prefix("C "))
    {
        let category = category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case("all") {
            return BrowseAction::AllCategories;
        }
        return BrowseAction::Filter(category.to_string());
    }
    BrowseAction::Next
}

fn show_random(
    book: &QuoteBook<SqliteKeyValueStore>,
    session: &mut SessionState<MemoryKeyValueStore>,
) -> Result<(), CliError> {
    let category = session
        .last_category()
        .filter(|c| c != "all");
    match book.pick_random(category.as_deref()) {
        Some(quote) => {
            print_quote(quote);
            session.set_last_quote(quote)?;
        }
        None => println!("No quotes available for this category."),
    }
    Ok(())
}

fn run_add(text_parts: &[String], category: &str, db_path: &Path) -> Result<(), CliError> {
    let text = text_parts.join(" ");
    if text.trim().is_empty() {
        return Err(CliError::EmptyText);
    }

    let mut book = open_book(db_path)?;
    let quote = book.add(&text, category)?;
    println!("{}", quote.id);
    Ok(())
}

fn run_list(
    category: Option<&str>,
    all: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let mut book = open_book(db_path)?;
    let filter = effective_filter(&mut book, category, all)?;
    let quotes = book.filtered(filter.as_deref());

    if quotes.is_empty() {
        println!("No quotes found for this category.");
        return Ok(());
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&quotes)?);
    } else {
        for quote in quotes {
            println!("{}", format_quote_line(quote));
        }
    }
    Ok(())
}

/// Decide the list filter and remember an explicit choice for next time.
/// The stored sentinel "all" means no filter.
fn effective_filter(
    book: &mut QuoteBook<SqliteKeyValueStore>,
    category: Option<&str>,
    all: bool,
) -> Result<Option<String>, CliError> {
    if all {
        book.set_last_filter("all")?;
        return Ok(None);
    }
    if let Some(category) = category {
        book.set_last_filter(category)?;
        return Ok(Some(category.to_string()));
    }
    Ok(book.last_filter().filter(|stored| stored != "all"))
}

fn run_categories(db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path)?;
    for category in book.categories() {
        println!("{category}");
    }
    Ok(())
}

fn run_import(file: &Path, db_path: &Path) -> Result<(), CliError> {
    let payload = std::fs::read_to_string(file)?;
    let mut book = open_book(db_path)?;
    let added = book.import_json(&payload)?;
    println!("Imported {added} quote(s).");
    Ok(())
}

fn run_export(output: Option<Option<PathBuf>>, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path)?;
    let rendered = book.export_json()?;

    match output {
        Some(path) => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(suggested_export_file_name(chrono::Utc::now().date_naive()))
            });
            std::fs::write(&path, rendered)?;
            println!("{}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn run_sync(
    watch: bool,
    interval: u64,
    resolve: Option<Resolution>,
    db_path: &Path,
) -> Result<(), CliError> {
    let remote = HttpRemote::with_base_url(remote_base_url())?;
    let mut engine = SyncEngine::new(remote);
    let mut book = open_book(db_path)?;

    if !watch {
        return run_sync_cycle(&mut engine, &mut book, resolve).await;
    }

    // First tick fires immediately, then every `interval` seconds.
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    loop {
        ticker.tick().await;
        if let Err(error) = run_sync_cycle(&mut engine, &mut book, resolve).await {
            tracing::warn!(%error, "sync cycle failed; retrying on next tick");
        }
    }
}

async fn run_sync_cycle(
    engine: &mut SyncEngine<HttpRemote>,
    book: &mut QuoteBook<SqliteKeyValueStore>,
    resolve: Option<Resolution>,
) -> Result<(), CliError> {
    let cycle = engine.sync(book).await;
    println!("{}", engine.state().status_text());
    cycle?;

    if book.has_conflicts() {
        resolve_conflicts(book, resolve)?;
    }
    Ok(())
}

fn resolve_conflicts(
    book: &mut QuoteBook<SqliteKeyValueStore>,
    choice: Option<Resolution>,
) -> Result<(), CliError> {
    let conflicts: Vec<Conflict> = book.conflicts().to_vec();
    let total = conflicts.len();

    if let Some(choice) = choice {
        for conflict in &conflicts {
            book.resolve(&conflict.id, choice)?;
        }
        let kept_local = if choice == Resolution::Local { total } else { 0 };
        println!(
            "Conflicts resolved. Kept local: {kept_local}, accepted server: {}",
            total - kept_local
        );
        return Ok(());
    }

    if !io::stdin().is_terminal() {
        println!(
            "{total} conflict(s) pending; server versions kept by default. \
             Re-run with --resolve local|server to override."
        );
        book.dismiss_conflicts();
        return Ok(());
    }

    let stdin = io::stdin();
    let mut kept_local = 0;
    for conflict in conflicts {
        println!("Conflict on {}", conflict.id);
        println!(
            "  local:  \"{}\" — {}",
            conflict.local.text, conflict.local.category
        );
        println!(
            "  server: \"{}\" — {}",
            conflict.server.text, conflict.server.category
        );
        print!("Keep [l]ocal or [s]erver? ");
        io::stdout().flush()?;

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        let choice = if line.trim().eq_ignore_ascii_case("l") {
            kept_local += 1;
            Resolution::Local
        } else {
            Resolution::Server
        };
        book.resolve(&conflict.id, choice)?;
    }
    println!(
        "Conflicts resolved. Kept local: {kept_local}, accepted server: {}",
        total - kept_local
    );
    Ok(())
}

fn run_reset(db_path: &Path) -> Result<(), CliError> {
    let mut book = open_book(db_path)?;
    book.reset_defaults()?;
    println!("Defaults restored.");
    Ok(())
}

fn run_clear(db_path: &Path) -> Result<(), CliError> {
    let mut book = open_book(db_path)?;
    book.clear()?;
    println!("Local data cleared.");
    Ok(())
}

fn print_quote(quote: &Quote) {
    println!("\u{201c}{}\u{201d}", quote.text);
    println!("— {}", quote.category);
}

fn format_quote_line(quote: &Quote) -> String {
    if quote.pending {
        format!("\"{}\" — {} (pending sync)", quote.text, quote.category)
    } else {
        format!("\"{}\" — {}", quote.text, quote.category)
    }
}

fn remote_base_url() -> String {
    env::var("QUIP_REMOTE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("QUIP_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quip")
        .join("quip.db")
}

fn open_book(path: &Path) -> Result<QuoteBook<SqliteKeyValueStore>, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kv = SqliteKeyValueStore::open(path)?;
    Ok(QuoteBook::open(kv)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;
    use quip_core::store::{MemoryKeyValueStore, SessionState};
    use quip_core::Quote;

    use super::{
        effective_filter, format_quote_line, open_book, parse_browse_action, run_add, run_clear,
        run_export, run_import, run_reset, show_random, BrowseAction, CliError,
    };

    fn unique_test_db_path() -> PathBuf {
        static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("quip-cli-test-{timestamp}-{sequence}.db"))
    }

    fn cleanup_db_files(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
    }

    #[test]
    fn format_quote_line_marks_pending() {
        let mut quote = Quote::new_local("text", "Cat");
        assert_eq!(format_quote_line(&quote), "\"text\" — Cat (pending sync)");

        quote.pending = false;
        assert_eq!(format_quote_line(&quote), "\"text\" — Cat");
    }

    #[test]
    fn parse_browse_action_variants() {
        assert_eq!(parse_browse_action("\n"), BrowseAction::Next);
        assert_eq!(parse_browse_action("anything"), BrowseAction::Next);
        assert_eq!(parse_browse_action("q\n"), BrowseAction::Quit);
        assert_eq!(
            parse_browse_action("c Life\n"),
            BrowseAction::Filter("Life".to_string())
        );
        assert_eq!(parse_browse_action("c all\n"), BrowseAction::AllCategories);
        assert_eq!(parse_browse_action("c \n"), BrowseAction::AllCategories);
    }

    #[test]
    fn show_random_records_session_state() {
        let db_path = unique_test_db_path();
        let book = open_book(&db_path).unwrap();
        let mut session = SessionState::new(MemoryKeyValueStore::new());
        assert!(session.last_quote().is_none());

        show_random(&book, &mut session).unwrap();
        assert!(session.last_quote().is_some());

        // A filter with no matches prints a notice and records nothing new.
        session.set_last_category("Missing").unwrap();
        let remembered = session.last_quote().unwrap();
        show_random(&book, &mut session).unwrap();
        assert_eq!(session.last_quote().unwrap(), remembered);

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_add_appends_pending_quote() {
        let db_path = unique_test_db_path();

        run_add(
            &["fresh".to_string(), "thought".to_string()],
            "Ideas",
            &db_path,
        )
        .unwrap();

        let book = open_book(&db_path).unwrap();
        let added = book
            .quotes()
            .iter()
            .find(|q| q.text == "fresh thought")
            .unwrap();
        assert!(added.pending);
        assert_eq!(added.category, "Ideas");

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_add_rejects_empty_text() {
        let db_path = unique_test_db_path();
        let error = run_add(&[" ".to_string()], "Cat", &db_path).unwrap_err();
        assert!(matches!(error, CliError::EmptyText));
        cleanup_db_files(&db_path);
    }

    #[test]
    fn effective_filter_remembers_explicit_choice() {
        let db_path = unique_test_db_path();
        let mut book = open_book(&db_path).unwrap();

        // explicit category is stored and applied
        let filter = effective_filter(&mut book, Some("Life"), false).unwrap();
        assert_eq!(filter.as_deref(), Some("Life"));

        // absent arg falls back to the remembered filter
        let filter = effective_filter(&mut book, None, false).unwrap();
        assert_eq!(filter.as_deref(), Some("Life"));

        // --all clears it
        let filter = effective_filter(&mut book, None, true).unwrap();
        assert_eq!(filter, None);
        let filter = effective_filter(&mut book, None, false).unwrap();
        assert_eq!(filter, None);

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_import_reports_added_count() {
        let db_path = unique_test_db_path();
        let import_path = std::env::temp_dir().join(format!(
            "quip-import-test-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ));
        std::fs::write(
            &import_path,
            r#"[{"text":"Imported wisdom","category":"Files"}]"#,
        )
        .unwrap();

        run_import(&import_path, &db_path).unwrap();

        let book = open_book(&db_path).unwrap();
        assert!(book.quotes().iter().any(|q| q.text == "Imported wisdom"));

        let _ = std::fs::remove_file(import_path);
        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_export_writes_json_file() {
        let db_path = unique_test_db_path();
        let output_path = std::env::temp_dir().join(format!(
            "quip-export-test-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ));

        run_export(Some(Some(output_path.clone())), &db_path).unwrap();

        let exported = std::fs::read_to_string(&output_path).unwrap();
        let parsed: Vec<Quote> = serde_json::from_str(&exported).unwrap();
        assert_eq!(parsed.len(), 3); // seeded defaults

        let _ = std::fs::remove_file(output_path);
        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_reset_restores_seed_defaults() {
        let db_path = unique_test_db_path();
        run_add(&["extra".to_string()], "Cat", &db_path).unwrap();

        run_reset(&db_path).unwrap();

        let book = open_book(&db_path).unwrap();
        assert_eq!(book.len(), 3);
        assert!(!book.quotes().iter().any(|q| q.text == "extra"));

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_clear_erases_persisted_state() {
        let db_path = unique_test_db_path();
        run_add(&["wipe me".to_string()], "Cat", &db_path).unwrap();

        run_clear(&db_path).unwrap();

        // Next open falls back to the seed defaults.
        let book = open_book(&db_path).unwrap();
        assert_eq!(book.len(), 3);
        assert!(!book.quotes().iter().any(|q| q.text == "wipe me"));

        cleanup_db_files(&db_path);
    }
}
