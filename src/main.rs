//! Terminal note-taking: search-as-you-type over a directory of plain text notes.
//!
//! Binary crate entry point. All CLI logic is in the `cli` module.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Re-export core types from library crate
pub use tvnotes::{
    expand_root, BruteForceSearch, FilterResult, Note, NoteWatcher, Notebook, NotebookChange,
    NotebookConfig, NotebookError, RegexSearch, SearchEngine,
};

mod cli;

fn main() {
    cli::run();
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
