//! Unified error type for the notebook core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in notebook operations.
#[derive(Error, Debug)]
pub enum NotebookError {
    /// I/O error not tied to a specific note
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Notebook root could not be created or accessed (fatal at startup)
    #[error("Could not open notebook at {}: {source}", path.display())]
    IndexOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parent directory or backing file of a note could not be created
    #[error("Could not create note {}: {source}", path.display())]
    NoteCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Title normalizes to an empty basename
    #[error("Invalid note title: '{title}'")]
    InvalidNoteTitle { title: String },

    /// Extension contains a path separator and would escape the note's directory
    #[error("Invalid note extension: '{extension}'")]
    InvalidNoteExtension { extension: String },

    /// A note with the same title and extension is already indexed
    #[error("Note already in notebook: {title}")]
    NoteAlreadyExists { title: String },

    /// Backing file of an existing note could not be read
    #[error("Could not read note {}: {source}", path.display())]
    NoteRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem subscription could not be established
    #[error("Could not watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Config file exists but cannot be read or parsed
    #[error("Invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl NotebookError {
    /// True for errors a caller is expected to recover from without aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NotebookError::InvalidNoteTitle { .. }
                | NotebookError::InvalidNoteExtension { .. }
                | NotebookError::NoteAlreadyExists { .. }
        )
    }
}
