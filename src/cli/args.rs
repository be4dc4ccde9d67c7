//! CLI argument structs for all subcommands.

use std::path::PathBuf;

use clap::{Args, Parser};

/// Options accepted by every subcommand. Each one overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file to read (default: ~/.tvrc)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Editor command used to open notes, e.g. "vim" or "code -w"
    #[arg(short, long, global = true)]
    pub editor: Option<String>,

    /// Extension for new notes (default: txt)
    #[arg(short = 'x', long, global = true)]
    pub extension: Option<String>,

    /// Comma-separated extensions recognized as notes, e.g. "txt,md"
    #[arg(long, global = true)]
    pub extensions: Option<String>,

    /// Comma-separated file and directory names to skip, e.g. "tmp,old"
    #[arg(long, global = true)]
    pub exclude: Option<String>,

    /// Notes directory (default: ~/Notes)
    #[arg(short, long, global = true)]
    pub notes_dir: Option<PathBuf>,

    /// Log file (default: ~/.tvlog)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (default: warn)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search words. Every word must appear in the title or contents.
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Treat each word as a regular expression
    #[arg(short, long)]
    pub regex: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note title; may contain '/' to create the note in a subdirectory
    pub title: String,

    /// Extension for this note (default: the configured extension)
    #[arg(long)]
    pub ext: Option<String>,
}

#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Query; opens the autocompleted note, or creates a note with this title
    #[arg(required = true)]
    pub query: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Query to keep filtering by (default: all notes)
    pub query: Vec<String>,

    /// Treat each word as a regular expression
    #[arg(short, long)]
    pub regex: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}
