//! Command-line adapter over `tasklist_core`.
//!
//! # Responsibility
//! - Own the task store for one invocation and forward a single intent.
//! - Render the derived view, stats, and persistence warnings as text.
//!
//! # Invariants
//! - Destructive commands require `--yes`.
//! - Store errors exit with code 1, bootstrap failures with code 2.

use clap::{Parser, Subcommand};
use log::info;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist_core::db::open_db;
use tasklist_core::{
    default_log_level, format_timestamp, init_logging, CoreConfig, KeyValueStore,
    SqliteKeyValueStore, StatusFilter, StoreError, Task, TaskId, TaskStore, DEFAULT_MAX_TEXT_LEN,
    DEFAULT_STORAGE_KEY,
};

const DEFAULT_DB_FILE_NAME: &str = "tasklist.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "tasklist", version, about = "Manage a local task list")]
struct Cli {
    /// SQLite file holding the task list.
    #[arg(long, env = "TASKLIST_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "TASKLIST_LOG_DIR", global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "TASKLIST_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Maximum task text length in characters.
    #[arg(long, env = "TASKLIST_MAX_TEXT_LEN", default_value_t = DEFAULT_MAX_TEXT_LEN, global = true)]
    max_text_len: usize,

    /// Storage key the collection is saved under.
    #[arg(long, env = "TASKLIST_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY, global = true)]
    storage_key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a task at the top of the list.
    Add { text: String },
    /// Replace the text of a task.
    Edit { id: String, text: String },
    /// Flip a task between pending and completed.
    Toggle { id: String },
    /// Delete a task.
    Delete {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Show tasks, optionally searched and filtered.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
    },
    /// Show total, pending, and completed counts.
    Stats,
    /// Delete every completed task.
    ClearCompleted,
    /// Delete all tasks and the saved data.
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug)]
enum CliError {
    Store(StoreError),
    InvalidId,
    NotConfirmed(&'static str),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidId => write!(f, "task id cannot be empty"),
            Self::NotConfirmed(command) => {
                write!(f, "`{command}` is destructive; pass --yes to confirm")
            }
        }
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("error: cannot open `{}`: {err}", db_path.display());
            return ExitCode::from(2);
        }
    };

    let config = CoreConfig::default()
        .with_max_text_len(cli.max_text_len)
        .with_storage_key(cli.storage_key.clone());
    let mut store = match TaskStore::open(SqliteKeyValueStore::new(&conn), config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };
    info!("event=cli_start module=cli status=ok db_path={}", db_path.display());

    let result = run(&mut store, cli.command);
    for warning in store.take_warnings() {
        eprintln!("warning: {warning}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run<S: KeyValueStore>(store: &mut TaskStore<S>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Add { text } => {
            let task = store.add(&text)?;
            println!("added {}", task.id());
        }
        Command::Edit { id, text } => {
            let id = parse_id(&id)?;
            store.start_editing(id.clone());
            let result = store.update(&id, &text);
            store.stop_editing();
            println!("updated {}", result?.id());
        }
        Command::Toggle { id } => {
            let task = store.toggle(&parse_id(&id)?)?;
            let state = if task.is_completed() {
                "completed"
            } else {
                "pending"
            };
            println!("{} is now {state}", task.id());
        }
        Command::Delete { id, yes } => {
            if !yes {
                return Err(CliError::NotConfirmed("delete"));
            }
            let task = store.delete(&parse_id(&id)?)?;
            println!("deleted {}", task.id());
        }
        Command::List { search, filter } => {
            if let Some(term) = search {
                store.set_search(&term);
            }
            store.set_filter(filter);
            render_view(store);
            return Ok(());
        }
        Command::Stats => {}
        Command::ClearCompleted => {
            let removed = store.clear_completed();
            println!("removed {removed} completed task(s)");
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(CliError::NotConfirmed("reset"));
            }
            store.clear_all();
            println!("all tasks removed");
        }
    }

    render_stats(store);
    Ok(())
}

fn parse_id(raw: &str) -> Result<TaskId, CliError> {
    TaskId::parse(raw).ok_or(CliError::InvalidId)
}

fn render_view<S: KeyValueStore>(store: &TaskStore<S>) {
    let visible = store.visible();
    if visible.is_empty() {
        println!("no tasks");
    }
    for task in visible {
        println!("{}", render_task(task));
    }
    render_stats(store);
}

fn render_task(task: &Task) -> String {
    let mark = if task.is_completed() { 'x' } else { ' ' };
    format!(
        "[{mark}] {}  {}  (updated {})",
        task.id(),
        task.text(),
        format_timestamp(task.updated_at())
    )
}

fn render_stats<S: KeyValueStore>(store: &TaskStore<S>) {
    let stats = store.stats();
    println!(
        "{} total, {} pending, {} completed",
        stats.total, stats.pending, stats.completed
    );
}
