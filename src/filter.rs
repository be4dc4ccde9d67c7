//! Filter/autocomplete coordinator: the one call a front end makes per keystroke.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::note::Note;
use crate::notebook::Notebook;

/// Sorted matches for one query plus the suggested completion, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    /// Matching notes, most recently modified first.
    pub matches: Vec<Note>,
    /// First match whose title starts with the query, ignoring case.
    pub autocomplete: Option<Note>,
}

/// Search `notebook`, sort by modification time and pick the autocomplete candidate.
///
/// The sort is stable: notes with equal timestamps keep index order. A note
/// whose file vanished since it was matched sorts last.
pub fn filter_notes(notebook: &Notebook, query: &str) -> FilterResult {
    let matches = sort_by_recency(notebook.search(query));
    let autocomplete = autocomplete_candidate(&matches, query).cloned();
    FilterResult {
        matches,
        autocomplete,
    }
}

/// Stable sort, most recently modified first.
pub fn sort_by_recency(notes: Vec<Note>) -> Vec<Note> {
    let mut keyed: Vec<(SystemTime, Note)> = notes
        .into_iter()
        .map(|note| (note.modified().unwrap_or(UNIX_EPOCH), note))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, note)| note).collect()
}

/// First note whose title case-insensitively starts with `query`.
/// An empty query never autocompletes.
pub fn autocomplete_candidate<'a>(notes: &'a [Note], query: &str) -> Option<&'a Note> {
    if query.is_empty() {
        return None;
    }
    let query = query.to_lowercase();
    notes
        .iter()
        .find(|note| note.title().to_lowercase().starts_with(&query))
}
