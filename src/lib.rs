//! # tvnotes: plain-text notebook core
//!
//! Notes are plain text files under one root directory. This crate keeps an
//! in-memory index of them, keeps that index in sync with the disk through a
//! filesystem watcher, and answers the keystroke-driven search/filter/
//! autocomplete queries a terminal front end issues.
//!
//! ## Library usage
//!
//! ```no_run
//! use tvnotes::{Notebook, NotebookConfig};
//!
//! let notebook = Notebook::open(NotebookConfig::new("~/Notes"))?;
//! let result = notebook.filter("shop");
//! for note in &result.matches {
//!     println!("{}", note.title());
//! }
//! # Ok::<(), tvnotes::NotebookError>(())
//! ```

use std::path::{Path, PathBuf};

pub mod error;
pub mod filter;
pub mod note;
pub mod notebook;
pub mod search;
pub mod watcher;

pub use error::NotebookError;
pub use filter::{filter_notes, FilterResult};
pub use note::{normalize_extension, Note};
pub use notebook::{expand_root, Notebook, NotebookConfig};
pub use search::{BruteForceSearch, RegexSearch, SearchEngine};
pub use watcher::{NoteWatcher, NotebookChange};

/// Strip the `\\?\` extended-length path prefix that Windows canonicalize adds.
#[must_use]
pub fn clean_path(p: PathBuf) -> PathBuf {
    match p.to_str().and_then(|s| s.strip_prefix(r"\\?\")) {
        Some(stripped) => PathBuf::from(stripped),
        None => p,
    }
}

/// Read a file as a String, using lossy UTF-8 conversion for non-UTF8 files.
/// Returns `(content, was_lossy)` where `was_lossy` is true if replacement characters
/// were inserted. Notes written by other tools in legacy encodings stay searchable.
pub fn read_file_lossy(path: &Path) -> std::io::Result<(String, bool)> {
    let raw = std::fs::read(path)?;
    match String::from_utf8(raw) {
        Ok(s) => Ok((s, false)),
        Err(e) => Ok((String::from_utf8_lossy(e.as_bytes()).into_owned(), true)),
    }
}

/// True if a search word must be matched verbatim.
///
/// Smart case: a word with any uppercase character is case-sensitive,
/// everything else is matched against lowercased text.
#[must_use]
pub fn is_case_sensitive(word: &str) -> bool {
    word.chars().any(char::is_uppercase)
}


// ─── Property-based tests (proptest) ─────────────────────────────────
