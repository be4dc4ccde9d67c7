//! Filesystem watcher: keeps a shared [`Notebook`] in sync with external changes.
//!
//! A dedicated thread receives `notify` events and only ever calls the two
//! thread-safe mutation entry points, [`Notebook::add_new`] and
//! [`Notebook::remove`]. Each applied change is reported to the caller's
//! callback so a front end can re-run its current filter.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::NotebookError;
use crate::note::Note;
use crate::notebook::Notebook;

/// A change applied to the notebook in response to a filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookChange {
    Added(Note),
    Removed(Note),
}

/// Handle to a running watch. Dropping it releases the directory watch and
/// stops the worker thread.
pub struct NoteWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl NoteWatcher {
    /// Start watching the notebook root recursively.
    ///
    /// Failing to establish the subscription is an error; errors delivered
    /// later are logged and the session keeps going.
    pub fn start<F>(notebook: Arc<Notebook>, on_change: F) -> Result<NoteWatcher, NotebookError>
    where
        F: Fn(NotebookChange) + Send + 'static,
    {
        let root = notebook.root().to_path_buf();
        let watch_error = |source: notify::Error| NotebookError::Watch {
            path: root.clone(),
            source,
        };

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(tx, Config::default()).map_err(watch_error)?;
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(watch_error)?;

        info!(root = %root.display(), "File watcher started");

        std::thread::Builder::new()
            .name("note-watcher".to_string())
            .spawn(move || run_event_loop(&notebook, rx, on_change))?;

        Ok(NoteWatcher {
            _watcher: watcher,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Process events until the sending half (owned by the watcher) is dropped.
fn run_event_loop<F>(notebook: &Notebook, rx: Receiver<notify::Result<Event>>, on_change: F)
where
    F: Fn(NotebookChange),
{
    for result in rx {
        match result {
            Ok(event) => {
                for change in apply_event(notebook, &event) {
                    on_change(change);
                }
            }
            Err(e) => {
                warn!(error = %e, "File watcher error, notebook may drift from disk");
            }
        }
    }
    info!("Watcher channel disconnected, stopping");
}

/// Translate one filesystem event into notebook mutations.
///
/// Directory events are ignored. A create for a note that is already indexed
/// (typically one the notebook just created itself) and a delete for a note
/// that is not indexed are both silently tolerated.
pub fn apply_event(notebook: &Notebook, event: &Event) -> Vec<NotebookChange> {
    let mut changes = Vec::new();
    match &event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {}
        EventKind::Create(_) => {
            for path in &event.paths {
                changes.extend(created(notebook, path));
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                changes.extend(deleted(notebook, path));
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                for path in &event.paths {
                    changes.extend(deleted(notebook, path));
                }
            }
            RenameMode::To => {
                for path in &event.paths {
                    changes.extend(created(notebook, path));
                }
            }
            RenameMode::Both => {
                if let [from, to] = event.paths.as_slice() {
                    changes.extend(deleted(notebook, from));
                    changes.extend(created(notebook, to));
                }
            }
            // Backends that can't tell which side they saw: trust the disk.
            _ => {
                for path in &event.paths {
                    if path.exists() {
                        changes.extend(created(notebook, path));
                    } else {
                        changes.extend(deleted(notebook, path));
                    }
                }
            }
        },
        _ => {}
    }
    changes
}

fn created(notebook: &Notebook, path: &Path) -> Option<NotebookChange> {
    if !path.is_file() {
        return None;
    }
    let (title, extension) = notebook.note_key(path)?;
    debug!(path = %path.display(), "Detected new file");
    match notebook.add_new(&title, Some(&extension)) {
        Ok(note) => Some(NotebookChange::Added(note)),
        Err(NotebookError::NoteAlreadyExists { title }) => {
            debug!(title = %title, "Note already indexed, ignoring create event");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not index new file");
            None
        }
    }
}

fn deleted(notebook: &Notebook, path: &Path) -> Option<NotebookChange> {
    debug!(path = %path.display(), "Detected deleted file");
    notebook.remove(path).map(NotebookChange::Removed)
}
