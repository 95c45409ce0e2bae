//! Pure read-side derivation: tag filter, text search, sort.
//! Every function copies; the input sequence is never mutated.

use core_types::{Note, SortMode, TagFilter};

/// Selection a list screen holds: recomputed from the full collection on
/// every input change.
#[derive(Debug, Clone, Default)]
pub struct NoteView {
    pub tag_filter: TagFilter,
    pub search: String,
    pub sort: SortMode,
}

impl NoteView {
    pub fn new(tag_filter: TagFilter, search: impl Into<String>, sort: SortMode) -> Self {
        Self {
            tag_filter,
            search: search.into(),
            sort,
        }
    }

    /// Tag filter, then text search, then sort.
    pub fn apply(&self, notes: &[Note]) -> Vec<Note> {
        let by_tag = filter_by_tag(notes, self.tag_filter);
        let matched = search(&by_tag, &self.search);
        sort(&matched, self.sort)
    }
}

/// Keeps notes matching the selected tag; `TagFilter::All` keeps everything.
pub fn filter_by_tag(notes: &[Note], filter: TagFilter) -> Vec<Note> {
    match filter {
        TagFilter::All => notes.to_vec(),
        TagFilter::Tag(tag) => notes
            .iter()
            .filter(|note| note.tag == tag)
            .cloned()
            .collect(),
    }
}

/// Case-insensitive substring match on title or content. A blank query
/// (after trimming) means no search.
pub fn search(notes: &[Note], query: &str) -> Vec<Note> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return notes.to_vec();
    }

    notes
        .iter()
        .filter(|note| {
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Stable sort on a copy of the input.
pub fn sort(notes: &[Note], mode: SortMode) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    match mode {
        SortMode::NewestFirst => sorted.sort_by(|a, b| b.date.cmp(&a.date)),
        SortMode::OldestFirst => sorted.sort_by(|a, b| a.date.cmp(&b.date)),
        SortMode::Alphabetical => {
            sorted.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
    }
    sorted
}
