//! A single note: one plain text file under the notebook root.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::NotebookError;
use crate::read_file_lossy;

/// Give an extension exactly one leading dot (`"md"`, `".md"` → `".md"`).
/// An empty extension stays empty.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    }
}

/// A note stored as a plain text file on disk.
///
/// Contents are never cached: every [`Note::contents`] call re-reads the file.
/// Two notes are equal iff their absolute paths are equal.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    title: String,
    extension: String,
    #[serde(serialize_with = "serialize_display")]
    path: PathBuf,
}

/// Paths serialize as text even when not valid UTF-8 (lossy).
fn serialize_display<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&path.display())
}

impl Note {
    /// Create a note titled `title` under `root`, touching its backing file.
    ///
    /// Missing parent directories are created. An existing file is opened for
    /// append and left untouched, never truncated.
    pub fn create(title: &str, root: &Path, extension: &str) -> Result<Note, NotebookError> {
        let extension = normalize_extension(extension);
        let path = root.join(format!("{}{}", title, extension));

        if let Some(parent) = path.parent()
            && !parent.is_dir()
        {
            debug!(dir = %parent.display(), "Note directory doesn't exist, creating it");
            fs::create_dir_all(parent).map_err(|source| NotebookError::NoteCreation {
                path: path.clone(),
                source,
            })?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| NotebookError::NoteCreation {
                path: path.clone(),
                source,
            })?;

        Ok(Note {
            title: title.to_string(),
            extension,
            path,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Extension with its leading dot, e.g. `".txt"`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole file decoded as text. Invalid UTF-8 is replaced, never an error.
    pub fn contents(&self) -> Result<String, NotebookError> {
        let (content, was_lossy) =
            read_file_lossy(&self.path).map_err(|source| NotebookError::NoteRead {
                path: self.path.clone(),
                source,
            })?;
        if was_lossy {
            warn!(path = %self.path.display(), "Note is not valid UTF-8, invalid bytes replaced");
        }
        Ok(content)
    }

    /// Last-modified time of the backing file. Used for ordering only.
    pub fn modified(&self) -> Result<SystemTime, NotebookError> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|source| NotebookError::NoteRead {
                path: self.path.clone(),
                source,
            })
    }

    pub(crate) fn same_key(&self, title: &str, extension: &str) -> bool {
        self.title == title && self.extension == extension
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Note {}
