//! CLI layer: argument parsing, command dispatch, and subcommand implementations.

pub mod args;
pub mod config;

pub use args::*;
pub use config::Settings;

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::{mpsc, Arc, Mutex};
use std::time::UNIX_EPOCH;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    expand_root, BruteForceSearch, FilterResult, Note, NoteWatcher, Notebook, NotebookChange,
    NotebookError, RegexSearch, SearchEngine,
};

// ─── CLI ─────────────────────────────────────────────────────────────

/// Plain-text notes from the terminal: search as you type, open in your editor
#[derive(Parser, Debug)]
#[command(name = "tv", version, about, after_help = "\
Run 'tv <COMMAND> --help' for detailed options.\n\
Settings are read from ~/.tvrc (TOML, or INI with a [DEFAULT] section); flags override it.")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// List all notes, most recently modified first
    List(ListArgs),

    /// Search note titles and contents
    Search(SearchArgs),

    /// Create a new note
    New(NewArgs),

    /// Open the note matching a query in the editor, creating it if needed
    Open(OpenArgs),

    /// Keep a query's results up to date while notes change on disk
    Watch(WatchArgs),

    /// Print the resolved configuration
    Config(ConfigArgs),
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();

    let result = Settings::resolve(&cli.global).and_then(|settings| {
        init_logging(&settings, cli.global.log_json);
        match cli.command {
            Commands::List(args) => cmd_list(&settings, args),
            Commands::Search(args) => cmd_search(&settings, args),
            Commands::New(args) => cmd_new(&settings, args),
            Commands::Open(args) => cmd_open(&settings, args),
            Commands::Watch(args) => cmd_watch(&settings, args),
            Commands::Config(args) => cmd_config(&settings, args),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Send logs to the log file so stdout stays clean for command output.
/// Falls back to stderr when the file cannot be opened. `RUST_LOG` wins over
/// the configured level.
fn init_logging(settings: &Settings, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let file = expand_root(&settings.log_file).and_then(|path| {
        OpenOptions::new().create(true).append(true).open(path)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match (file, json) {
        (Ok(file), true) => builder.json().with_ansi(false).with_writer(Mutex::new(file)).init(),
        (Ok(file), false) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        (Err(e), json) => {
            if json {
                builder.json().with_writer(io::stderr).init();
            } else {
                builder.with_writer(io::stderr).init();
            }
            warn!(path = %settings.log_file.display(), error = %e, "Could not open log file, logging to stderr");
        }
    }
}

fn open_notebook(settings: &Settings, regex: bool) -> Result<Notebook, NotebookError> {
    let engine: Box<dyn SearchEngine> = if regex {
        Box::new(RegexSearch)
    } else {
        Box::new(BruteForceSearch)
    };
    Notebook::open_with_engine(settings.notebook_config(), engine)
}

// ─── Output ─────────────────────────────────────────────────────────

fn modified_secs(note: &Note) -> Option<u64> {
    note.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

fn note_json(note: &Note) -> Result<serde_json::Value, NotebookError> {
    let mut value = serde_json::to_value(note).map_err(io::Error::from)?;
    value["modified"] = json!(modified_secs(note));
    Ok(value)
}

/// One line per match; the autocomplete candidate is marked with `>`.
fn render_text(result: &FilterResult) -> String {
    let mut out = String::new();
    for note in &result.matches {
        let marker = if result.autocomplete.as_ref() == Some(note) { ">" } else { " " };
        out.push_str(&format!("{} {}{}\n", marker, note.title(), note.extension()));
    }
    out
}

fn render_json(query: &str, result: &FilterResult) -> Result<String, NotebookError> {
    let value = json!({
        "query": query,
        "count": result.matches.len(),
        "autocomplete": result.autocomplete.as_ref().map(Note::title),
        "matches": result.matches.iter().map(note_json).collect::<Result<Vec<_>, _>>()?,
    });
    Ok(serde_json::to_string_pretty(&value).map_err(io::Error::from)?)
}

fn print_result(query: &str, result: &FilterResult, as_json: bool) -> Result<(), NotebookError> {
    if as_json {
        println!("{}", render_json(query, result)?);
    } else {
        print!("{}", render_text(result));
        eprintln!("{} note(s)", result.matches.len());
    }
    Ok(())
}

// ─── Commands ───────────────────────────────────────────────────────

fn cmd_list(settings: &Settings, args: ListArgs) -> Result<(), NotebookError> {
    let notebook = open_notebook(settings, false)?;
    print_result("", &notebook.filter(""), args.json)
}

fn cmd_search(settings: &Settings, args: SearchArgs) -> Result<(), NotebookError> {
    let notebook = open_notebook(settings, args.regex)?;
    let query = args.query.join(" ");
    print_result(&query, &notebook.filter(&query), args.json)
}

fn cmd_new(settings: &Settings, args: NewArgs) -> Result<(), NotebookError> {
    let notebook = open_notebook(settings, false)?;
    let note = match notebook.add_new(&args.title, args.ext.as_deref()) {
        Ok(note) => note,
        Err(NotebookError::NoteAlreadyExists { title }) => {
            eprintln!("Note already exists: {}", title);
            notebook
                .find(&title, args.ext.as_deref())
                .ok_or(NotebookError::NoteAlreadyExists { title })?
        }
        Err(e) => return Err(e),
    };
    println!("{}", note.path().display());
    Ok(())
}

/// Open the autocomplete candidate for the query, or a note titled by the query.
fn cmd_open(settings: &Settings, args: OpenArgs) -> Result<(), NotebookError> {
    let notebook = open_notebook(settings, false)?;
    let query = args.query.join(" ");
    let result = notebook.filter(&query);

    let note = match result.autocomplete {
        Some(note) => note,
        None => match notebook.add_new(&query, None) {
            Ok(note) => {
                info!(title = %note.title(), "Created note");
                note
            }
            Err(NotebookError::NoteAlreadyExists { title }) => notebook
                .find(&title, None)
                .ok_or(NotebookError::NoteAlreadyExists { title })?,
            Err(e) if e.is_recoverable() => {
                eprintln!("{}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        },
    };
    launch_editor(settings, note.path())
}

/// Run the editor with the note path appended. The editor string is split on
/// whitespace, so `code -w` works.
fn launch_editor(settings: &Settings, path: &Path) -> Result<(), NotebookError> {
    let mut parts = settings.editor.split_whitespace();
    let program = parts.next().ok_or_else(|| NotebookError::Config {
        path: settings.config_file.clone(),
        message: "editor is empty".to_string(),
    })?;

    info!(editor = %settings.editor, path = %path.display(), "Launching editor");
    let status = Command::new(program).args(parts).arg(path).status()?;
    if !status.success() {
        warn!(editor = %settings.editor, status = %status, "Editor exited with an error");
        eprintln!("Editor exited with {}", status);
    }
    Ok(())
}

enum WatchSignal {
    Changed(NotebookChange),
    Stop,
}

/// Print the filter result, then again after every change until Ctrl-C.
fn cmd_watch(settings: &Settings, args: WatchArgs) -> Result<(), NotebookError> {
    let notebook = Arc::new(open_notebook(settings, args.regex)?);
    let query = args.query.join(" ");
    let (tx, rx) = mpsc::channel::<WatchSignal>();

    let stop_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(WatchSignal::Stop);
    })
    .map_err(io::Error::other)?;

    let watcher = NoteWatcher::start(Arc::clone(&notebook), move |change| {
        let _ = tx.send(WatchSignal::Changed(change));
    })?;
    eprintln!("Watching {} (Ctrl-C to stop)", watcher.root().display());
    print!("{}", render_text(&notebook.filter(&query)));

    while let Ok(signal) = rx.recv() {
        let mut changes = Vec::new();
        let mut stop = false;
        // Coalesce a burst of events into one refresh.
        for signal in std::iter::once(signal).chain(rx.try_iter()) {
            match signal {
                WatchSignal::Changed(change) => changes.push(change),
                WatchSignal::Stop => stop = true,
            }
        }
        if stop {
            break;
        }
        for change in &changes {
            match change {
                NotebookChange::Added(note) => eprintln!("+ {}{}", note.title(), note.extension()),
                NotebookChange::Removed(note) => eprintln!("- {}{}", note.title(), note.extension()),
            }
        }
        println!("---");
        print!("{}", render_text(&notebook.filter(&query)));
    }

    drop(watcher);
    info!("Watch stopped");
    Ok(())
}

fn cmd_config(settings: &Settings, args: ConfigArgs) -> Result<(), NotebookError> {
    if args.json {
        let mut value = serde_json::to_value(settings).map_err(io::Error::from)?;
        value["config_file"] = json!(settings.config_file.display().to_string());
        println!("{}", serde_json::to_string_pretty(&value).map_err(io::Error::from)?);
    } else {
        let text = toml::to_string(settings).map_err(|e| NotebookError::Config {
            path: settings.config_file.clone(),
            message: e.to_string(),
        })?;
        println!("# {}", settings.config_file.display());
        print!("{}", text);
    }
    Ok(())
}
