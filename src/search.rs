//! Pluggable search strategies over the notes of a notebook.
//!
//! Engines only select; they never reorder. Result order equals the order of
//! the slice they are given, sorting is the filter coordinator's job.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::is_case_sensitive;
use crate::note::Note;

/// A search strategy. Implementations must be cheap enough to run on every keystroke.
pub trait SearchEngine: Send + Sync {
    /// Return the notes matching `query`, in the order given.
    fn search(&self, notes: &[Note], query: &str) -> Vec<Note>;
}

/// Lazily read a note's contents at most once per search call.
///
/// A note whose file cannot be read matches on its title only.
struct NoteText<'a> {
    note: &'a Note,
    contents: Option<String>,
    lowered_title: Option<String>,
    lowered_contents: Option<String>,
}

impl<'a> NoteText<'a> {
    fn new(note: &'a Note) -> Self {
        NoteText {
            note,
            contents: None,
            lowered_title: None,
            lowered_contents: None,
        }
    }

    fn title(&self) -> &str {
        self.note.title()
    }

    fn lowered_title(&mut self) -> &str {
        let title = self.note.title();
        self.lowered_title.get_or_insert_with(|| title.to_lowercase())
    }

    fn contents(&mut self) -> &str {
        let note = self.note;
        self.contents.get_or_insert_with(|| match note.contents() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Could not read note during search, matching title only");
                String::new()
            }
        })
    }

    fn lowered_contents(&mut self) -> &str {
        if self.lowered_contents.is_none() {
            let lowered = self.contents().to_lowercase();
            self.lowered_contents = Some(lowered);
        }
        self.lowered_contents.as_deref().unwrap_or_default()
    }
}

// ─── Brute-force token search ────────────────────────────────────────

/// Linear scan: a note matches iff every whitespace-separated query word is a
/// substring of its title or its contents. Smart case per word.
#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForceSearch;

impl BruteForceSearch {
    fn word_matches(text: &mut NoteText<'_>, word: &str) -> bool {
        if is_case_sensitive(word) {
            text.title().contains(word) || text.contents().contains(word)
        } else {
            let word = word.to_lowercase();
            text.lowered_title().contains(&word) || text.lowered_contents().contains(&word)
        }
    }
}

impl SearchEngine for BruteForceSearch {
    fn search(&self, notes: &[Note], query: &str) -> Vec<Note> {
        let words: Vec<&str> = query.split_whitespace().collect();
        notes
            .iter()
            .filter(|note| {
                let mut text = NoteText::new(note);
                words.iter().all(|word| Self::word_matches(&mut text, word))
            })
            .cloned()
            .collect()
    }
}

// ─── Regex search ────────────────────────────────────────────────────

/// Every query word is a regular expression that must match the title or the
/// contents. Smart case as in [`BruteForceSearch`]. A word that does not
/// compile (e.g. a half-typed `foo(`) is matched literally.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSearch;

impl RegexSearch {
    /// Compile one query word, falling back to a literal match on syntax errors.
    pub fn compile_word(word: &str) -> Result<Regex, regex::Error> {
        let insensitive = !is_case_sensitive(word);
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(insensitive)
                .build()
        };
        build(word).or_else(|_| build(&regex::escape(word)))
    }
}

impl SearchEngine for RegexSearch {
    fn search(&self, notes: &[Note], query: &str) -> Vec<Note> {
        let patterns: Vec<Regex> = match query.split_whitespace().map(Self::compile_word).collect() {
            Ok(p) => p,
            Err(e) => {
                // Only the compiled-size limit can fail once a word is escaped.
                warn!(error = %e, "Query word could not be compiled, nothing matches");
                return Vec::new();
            }
        };
        notes
            .iter()
            .filter(|note| {
                let mut text = NoteText::new(note);
                patterns
                    .iter()
                    .all(|re| re.is_match(text.title()) || re.is_match(text.contents()))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn note(root: &Path, title: &str, contents: &str) -> Note {
        let n = Note::create(title, root, ".txt").unwrap();
        fs::write(n.path(), contents).unwrap();
        n
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title()).collect()
    }

    fn fixture(root: &Path) -> Vec<Note> {
        vec![
            note(root, "shopping", "milk eggs Foo"),
            note(root, "ideas", "a foo fighters tribute"),
            note(root, "Travel", "pack the FOO bag"),
            note(root, "recipes/pancakes", "flour milk"),
        ]
    }

    #[test]
    fn test_empty_query_matches_everything_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let found = BruteForceSearch.search(&notes, "");
        assert_eq!(titles(&found), vec!["shopping", "ideas", "Travel", "recipes/pancakes"]);
        let found = BruteForceSearch.search(&notes, "   ");
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_lowercase_word_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let found = BruteForceSearch.search(&notes, "foo");
        assert_eq!(titles(&found), vec!["shopping", "ideas", "Travel"]);
    }

    #[test]
    fn test_uppercase_word_is_case_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let found = BruteForceSearch.search(&notes, "Foo");
        assert_eq!(titles(&found), vec!["shopping"]);
    }

    #[test]
    fn test_title_match_without_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        assert_eq!(titles(&BruteForceSearch.search(&notes, "travel")), vec!["Travel"]);
        assert!(BruteForceSearch.search(&notes, "TRAVEL").is_empty());
        assert_eq!(titles(&BruteForceSearch.search(&notes, "recipes/")), vec!["recipes/pancakes"]);
    }

    #[test]
    fn test_every_word_must_match() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let found = BruteForceSearch.search(&notes, "milk eggs");
        assert_eq!(titles(&found), vec!["shopping"]);
        let found = BruteForceSearch.search(&notes, "milk");
        assert_eq!(titles(&found), vec!["shopping", "recipes/pancakes"]);
        assert!(BruteForceSearch.search(&notes, "milk tribute").is_empty());
    }

    #[test]
    fn test_words_may_split_between_title_and_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let found = BruteForceSearch.search(&notes, "pancakes flour");
        assert_eq!(titles(&found), vec!["recipes/pancakes"]);
    }

    #[test]
    fn test_unreadable_note_matches_title_only() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        fs::remove_file(notes[0].path()).unwrap();
        assert_eq!(titles(&BruteForceSearch.search(&notes, "shop")), vec!["shopping"]);
        assert!(BruteForceSearch.search(&notes, "eggs").is_empty());
    }

    #[test]
    fn test_search_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        let first = BruteForceSearch.search(&notes, "o");
        let second = BruteForceSearch.search(&notes, "o");
        assert_eq!(first, second);
    }

    #[test]
    fn test_regex_search_smart_case() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        assert_eq!(titles(&RegexSearch.search(&notes, "fo+")), vec!["shopping", "ideas", "Travel"]);
        assert_eq!(titles(&RegexSearch.search(&notes, "F[o]o")), vec!["shopping"]);
        assert_eq!(titles(&RegexSearch.search(&notes, "^recipes/")), vec!["recipes/pancakes"]);
    }

    #[test]
    fn test_regex_search_invalid_pattern_is_literal() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = vec![note(tmp.path(), "calls", "call foo( now")];
        assert_eq!(titles(&RegexSearch.search(&notes, "foo(")), vec!["calls"]);
        assert!(RegexSearch.search(&notes, "bar(").is_empty());
    }

    #[test]
    fn test_engines_are_object_safe() {
        let engines: Vec<Box<dyn SearchEngine>> = vec![Box::new(BruteForceSearch), Box::new(RegexSearch)];
        let tmp = tempfile::tempdir().unwrap();
        let notes = fixture(tmp.path());
        for engine in &engines {
            assert_eq!(engine.search(&notes, "").len(), 4);
        }
    }
}
