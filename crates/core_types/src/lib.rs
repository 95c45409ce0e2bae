use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type NoteId = Uuid;

/// Failure raised by the underlying key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid store key `{0}`")]
    InvalidKey(String),
}

/// On-device key-value store contract. Whole string blobs keyed by string;
/// a missing key reads as `None`, never as an error.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NoteTag {
    #[default]
    Personal,
    Work,
    Ideas,
    Tasks,
}

impl NoteTag {
    pub const ALL: [NoteTag; 4] = [
        NoteTag::Personal,
        NoteTag::Work,
        NoteTag::Ideas,
        NoteTag::Tasks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteTag::Personal => "personal",
            NoteTag::Work => "work",
            NoteTag::Ideas => "ideas",
            NoteTag::Tasks => "tasks",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "personal" => Some(NoteTag::Personal),
            "work" => Some(NoteTag::Work),
            "ideas" => Some(NoteTag::Ideas),
            "tasks" => Some(NoteTag::Tasks),
            _ => None,
        }
    }
}

impl std::fmt::Display for NoteTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-authored note. Field names on the wire are fixed by the
/// stored format and must not change without a schema bump.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
    pub date: DateTime<Utc>,
    #[serde(rename = "isPinned")]
    pub is_pinned: bool,
}

impl Note {
    /// Builds a brand-new note from a draft: fresh id, current timestamp,
    /// unpinned.
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            tag: draft.tag,
            date: Utc::now(),
            is_pinned: false,
        }
    }

    /// Title as shown in a list; blank titles render as "Untitled Note".
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Note"
        } else {
            &self.title
        }
    }
}

/// User-editable fields of a note, as captured by an editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tag: NoteTag) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tag,
        }
    }
}

/// List filter selection; `All` is the sentinel that disables tag filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Tag(NoteTag),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    NewestFirst,
    OldestFirst,
    Alphabetical,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "system" => Some(ThemePreference::System),
            _ => None,
        }
    }

    /// Resolves the preference to a concrete dark-mode flag, falling back to
    /// the device appearance for `System`.
    pub fn resolves_dark(self, device_dark: bool) -> bool {
        match self {
            ThemePreference::Light => false,
            ThemePreference::Dark => true,
            ThemePreference::System => device_dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_serializes_with_wire_field_names() {
        let note = Note::from_draft(NoteDraft::new("Groceries", "milk, eggs", NoteTag::Personal));
        let json = serde_json::to_value(&note).expect("serialize note");
        let object = json.as_object().expect("note is an object");

        let mut keys = object.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        assert_eq!(keys, ["content", "date", "id", "isPinned", "tag", "title"]);
        assert_eq!(object["tag"], "personal");
        assert_eq!(object["isPinned"], false);
    }

    #[test]
    fn note_round_trips_through_json() {
        let note = Note::from_draft(NoteDraft::new("Budget", "Q3 numbers", NoteTag::Work));
        let json = serde_json::to_string(&note).expect("serialize note");
        let parsed: Note = serde_json::from_str(&json).expect("parse note");
        assert_eq!(parsed, note);
    }

    #[test]
    fn blank_title_displays_as_untitled() {
        let mut note = Note::from_draft(NoteDraft::default());
        assert_eq!(note.display_title(), "Untitled Note");
        note.title = "   ".to_owned();
        assert_eq!(note.display_title(), "Untitled Note");
        note.title = "Plans".to_owned();
        assert_eq!(note.display_title(), "Plans");
    }

    #[test]
    fn tag_parses_case_insensitively() {
        assert_eq!(NoteTag::parse(" Work "), Some(NoteTag::Work));
        assert_eq!(NoteTag::parse("IDEAS"), Some(NoteTag::Ideas));
        assert_eq!(NoteTag::parse("errands"), None);
    }

    #[test]
    fn theme_preference_resolves_against_device() {
        assert!(!ThemePreference::Light.resolves_dark(true));
        assert!(ThemePreference::Dark.resolves_dark(false));
        assert!(ThemePreference::System.resolves_dark(true));
        assert!(!ThemePreference::System.resolves_dark(false));
    }
}
