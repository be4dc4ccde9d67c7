//! The notebook: an in-memory, ordered index of the notes under one root directory.
//!
//! The note vector sits behind a single `RwLock`. Every mutation (`add_new`,
//! `remove`) takes the write lock, every traversal (`search`, sequence access)
//! takes the read lock, so the watcher thread and the query path never see a
//! half-updated index. A note's backing file is touched while the write lock
//! is held.

use std::fmt;
use std::fs;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR_STR};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use ignore::WalkBuilder;
use tracing::{debug, error, info, warn};

use crate::error::NotebookError;
use crate::filter::{filter_notes, FilterResult};
use crate::note::{normalize_extension, Note};
use crate::search::{BruteForceSearch, SearchEngine};
use crate::clean_path;

/// Default extension for new notes.
pub const DEFAULT_EXTENSION: &str = ".txt";
/// Extensions recognized as notes when scanning.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".txt", ".md", ".markdown", ".rst"];
/// File and directory names skipped when scanning and watching.
pub const DEFAULT_EXCLUDE: &[&str] = &["src", "backup", "ignore", "tmp", "old"];

// ─── Configuration ───────────────────────────────────────────────────

/// Typed settings the notebook is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookConfig {
    /// Root directory. May start with `~` and may be relative.
    pub root: PathBuf,
    pub default_extension: String,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

impl NotebookConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        NotebookConfig {
            root: root.into(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_default_extension(mut self, ext: impl Into<String>) -> Self {
        self.default_extension = ext.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for NotebookConfig {
    fn default() -> Self {
        NotebookConfig::new("~/Notes")
    }
}

/// Expand a leading `~` to the home directory and make the path absolute.
pub fn expand_root(root: &Path) -> std::io::Result<PathBuf> {
    let expanded = match (root.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => root.to_path_buf(),
    };
    std::path::absolute(expanded)
}

/// Trim a title, drop leading separators and `.` segments, and reject titles
/// whose last segment is empty. `..` segments are rejected too: a note must
/// live under the root.
pub(crate) fn normalize_title(raw: &str) -> Result<String, NotebookError> {
    let invalid = || NotebookError::InvalidNoteTitle {
        title: raw.to_string(),
    };

    let trimmed = raw.trim().trim_start_matches(is_separator);
    let mut segments: Vec<&str> = trimmed.split(is_separator).collect();

    match segments.last() {
        Some(last) if !last.trim().is_empty() && *last != "." && *last != ".." => {}
        _ => return Err(invalid()),
    }
    segments.retain(|s| !s.is_empty() && *s != ".");
    if segments.contains(&"..") {
        return Err(invalid());
    }
    Ok(segments.join(MAIN_SEPARATOR_STR))
}

/// Normalize an extension and reject one that contains a path separator:
/// `foo` + `/../x` would land outside the note's directory.
pub(crate) fn checked_extension(raw: &str) -> Result<String, NotebookError> {
    let extension = normalize_extension(raw);
    if extension.contains(is_separator) {
        return Err(NotebookError::InvalidNoteExtension {
            extension: raw.to_string(),
        });
    }
    Ok(extension)
}

// ─── Notebook ────────────────────────────────────────────────────────

/// Ordered, disk-backed collection of notes for one root directory.
///
/// Insertion order is kept; sorting is a search-time concern. At most one note
/// exists per `(title, extension)` pair.
pub struct Notebook {
    root: PathBuf,
    default_extension: String,
    extensions: Vec<String>,
    exclude: Vec<String>,
    notes: RwLock<Vec<Note>>,
    engine: Box<dyn SearchEngine>,
}

impl fmt::Debug for Notebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notebook")
            .field("root", &self.root)
            .field("default_extension", &self.default_extension)
            .field("extensions", &self.extensions)
            .field("exclude", &self.exclude)
            .field("notes", &self.len())
            .finish()
    }
}

impl Notebook {
    /// Open the notebook with the default brute-force search engine.
    pub fn open(config: NotebookConfig) -> Result<Notebook, NotebookError> {
        Self::open_with_engine(config, Box::new(BruteForceSearch))
    }

    /// Open the notebook: create the root if missing, then scan it for notes.
    pub fn open_with_engine(
        config: NotebookConfig,
        engine: Box<dyn SearchEngine>,
    ) -> Result<Notebook, NotebookError> {
        let start = Instant::now();
        let open_error = |source: std::io::Error| NotebookError::IndexOpen {
            path: config.root.clone(),
            source,
        };

        let root = expand_root(&config.root).map_err(open_error)?;
        if !root.is_dir() {
            debug!(root = %root.display(), "Notebook directory doesn't exist, creating it");
            fs::create_dir_all(&root).map_err(open_error)?;
        }
        let root = clean_path(fs::canonicalize(&root).map_err(open_error)?);

        let default_extension = checked_extension(&config.default_extension)?;
        let mut extensions: Vec<String> = Vec::with_capacity(config.extensions.len());
        for raw in &config.extensions {
            match checked_extension(raw) {
                Ok(ext) if !ext.is_empty() && !extensions.contains(&ext) => extensions.push(ext),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Ignoring recognized extension"),
            }
        }

        let notebook = Notebook {
            root,
            default_extension,
            extensions,
            exclude: config.exclude,
            notes: RwLock::new(Vec::new()),
            engine,
        };
        notebook.scan();

        info!(
            root = %notebook.root.display(),
            notes = notebook.len(),
            elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
            "Notebook opened"
        );
        Ok(notebook)
    }

    /// Walk the root and add every file that qualifies as a note.
    fn scan(&self) {
        let exclude = self.exclude.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| exclude.iter().any(|x| x == name))
            });

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry during scan");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|ft| ft.is_dir()) || !entry.path().is_file() {
                continue;
            }
            let Some((title, extension)) = self.note_key(entry.path()) else {
                continue;
            };
            if let Err(e) = self.add_new(&title, Some(&extension)) {
                warn!(path = %entry.path().display(), error = %e, "Skipping file during scan");
            }
        }
    }

    /// Map a file path to the `(title, extension)` of the note it would be,
    /// or `None` if the file is not a note. Used by both the initial scan and
    /// live filesystem events so the two never disagree.
    pub(crate) fn note_key(&self, path: &Path) -> Option<(String, String)> {
        let rel = self.relative(path)?;

        for component in rel.iter() {
            if let Some(name) = component.to_str()
                && self.exclude.iter().any(|x| x == name)
            {
                return None;
            }
        }

        let Some(file_name) = rel.file_name()?.to_str() else {
            error!(path = %path.display(), "Could not decode filename");
            return None;
        };
        if file_name.starts_with('.') || file_name.ends_with('~') {
            return None;
        }

        let extension = rel
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))?;
        if !self.extensions.contains(&extension) {
            return None;
        }

        let Some(title) = rel.with_extension("").to_str().map(str::to_string) else {
            error!(path = %path.display(), "Could not decode filename");
            return None;
        };
        // A name like " draft.txt" would be re-created trimmed as "draft.txt".
        if normalize_title(&title).ok()? != title {
            debug!(path = %path.display(), "File name is not a canonical note title, ignoring");
            return None;
        }
        Some((title, extension))
    }

    /// Path relative to the root. Relative input is taken as already relative.
    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => Some(rel),
                Err(_) => {
                    debug!(path = %path.display(), "Path is outside the notebook, ignoring");
                    None
                }
            }
        } else {
            Some(path)
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Note>> {
        self.notes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Note>> {
        self.notes.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Mutation ────────────────────────────────────────────────────

    /// Create a note and append it to the index.
    ///
    /// `extension` defaults to the notebook's default extension. Fails with
    /// `InvalidNoteTitle` if the title has an empty last segment,
    /// `InvalidNoteExtension` if the extension contains a path separator, and
    /// `NoteAlreadyExists` if the `(title, extension)` pair is indexed already.
    pub fn add_new(&self, title: &str, extension: Option<&str>) -> Result<Note, NotebookError> {
        let title = normalize_title(title)?;
        let extension = match extension {
            Some(ext) => checked_extension(ext)?,
            None => self.default_extension.clone(),
        };

        let mut notes = self.write();
        if notes.iter().any(|n| n.same_key(&title, &extension)) {
            return Err(NotebookError::NoteAlreadyExists { title });
        }
        let note = Note::create(&title, &self.root, &extension)?;
        notes.push(note.clone());
        debug!(title = %note.title(), extension = %note.extension(), count = notes.len(), "Added note");
        Ok(note)
    }

    /// Remove the note backed by `path` (absolute, or relative to the root).
    ///
    /// Returns the removed note, or `None` if no note matches. Never an error:
    /// duplicate or late filesystem events are expected.
    pub fn remove(&self, path: &Path) -> Option<Note> {
        let rel = self.relative(path)?;
        let extension = rel
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let Some(title) = rel.with_extension("").to_str().map(str::to_string) else {
            error!(path = %path.display(), "Could not decode filename");
            return None;
        };

        let mut notes = self.write();
        let pos = notes.iter().position(|n| n.same_key(&title, &extension))?;
        let note = notes.remove(pos);
        debug!(title = %note.title(), count = notes.len(), "Removed note");
        Some(note)
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Notes matching `query` in index order (unsorted), via the configured engine.
    pub fn search(&self, query: &str) -> Vec<Note> {
        let notes = self.read();
        self.engine.search(&notes, query)
    }

    /// Matches sorted most-recently-modified first, plus the autocomplete candidate.
    pub fn filter(&self, query: &str) -> FilterResult {
        filter_notes(self, query)
    }

    /// Look up a note by title and extension (default extension if `None`).
    pub fn find(&self, title: &str, extension: Option<&str>) -> Option<Note> {
        let title = normalize_title(title).ok()?;
        let extension = extension
            .map(normalize_extension)
            .unwrap_or_else(|| self.default_extension.clone());
        self.read()
            .iter()
            .find(|n| n.same_key(&title, &extension))
            .cloned()
    }

    // ─── Sequence access ─────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Note> {
        self.read().get(index).cloned()
    }

    /// Reversed lookup: `get_from_end(0)` is the most recently added note.
    pub fn get_from_end(&self, index: usize) -> Option<Note> {
        self.read().iter().rev().nth(index).cloned()
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.read().contains(note)
    }

    /// Copy of the current notes, in insertion order.
    pub fn snapshot(&self) -> Vec<Note> {
        self.read().clone()
    }

    /// Iterate over a snapshot. Double-ended, so `.rev()` walks newest-added first.
    pub fn iter(&self) -> std::vec::IntoIter<Note> {
        self.snapshot().into_iter()
    }

    // ─── Accessors ───────────────────────────────────────────────────

    /// Absolute, canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default extension, with its leading dot.
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }
}

impl IntoIterator for &Notebook {
    type Item = Note;
    type IntoIter = std::vec::IntoIter<Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "notebook_tests.rs"]
mod tests;
