//! Note repository: read-modify-write of the whole collection blob.
//!
//! # Invariants
//! - `id` is unique across the collection at all times.
//! - `revision` increases by exactly 1 on every successful mutation.
//! - Mutations in one process are serialized through an internal lock; a
//!   revision moved by another writer surfaces as `StaleCollection`.

use std::sync::Arc;

use chrono::Utc;
use core_types::{KvStore, Note, NoteDraft, NoteId, NoteTag, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const COLLECTION_KEY: &str = "NOTES";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("note {0} not found")]
    NotFound(NoteId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored note collection is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("stale collection: expected revision {expected}, found {found}")]
    StaleCollection { expected: u64, found: u64 },
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Stored shape of the collection. A bare JSON array (the pre-envelope
/// format) is still accepted on read as schema 1, revision 0.
#[derive(Debug, Serialize, Deserialize)]
struct CollectionEnvelope {
    schema: u32,
    revision: u64,
    notes: Vec<Note>,
}

impl CollectionEnvelope {
    fn empty() -> Self {
        Self {
            schema: SCHEMA_VERSION,
            revision: 0,
            notes: Vec::new(),
        }
    }
}

/// Single source of truth for durable note state. Owns the collection key;
/// nothing else reads or writes it.
pub struct NoteRepository {
    store: Arc<dyn KvStore>,
    // Serializes read-modify-write in this process and remembers the last
    // revision observed, so an outside writer is detected rather than
    // silently overwritten.
    gate: Mutex<Option<u64>>,
}

impl NoteRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(None),
        }
    }

    /// Ensures the collection key exists, writing an empty envelope when
    /// absent. Idempotent; safe to call on every start.
    pub async fn init(&self) -> RepoResult<()> {
        let mut last_seen = self.gate.lock().await;
        match self.store.get(COLLECTION_KEY).await? {
            Some(raw) => match parse_collection(&raw) {
                Ok(envelope) => {
                    *last_seen = Some(envelope.revision);
                }
                Err(error) => {
                    warn!(%error, "note collection unreadable at init; leaving as-is");
                }
            },
            None => {
                let envelope = CollectionEnvelope::empty();
                self.write(&envelope).await?;
                *last_seen = Some(0);
                debug!("initialized empty note collection");
            }
        }
        Ok(())
    }

    /// Appends a new note built from the draft and persists the collection.
    /// The returned note's id is unique against the then-current collection.
    pub async fn add(&self, draft: NoteDraft) -> RepoResult<Note> {
        let note = self
            .mutate(|notes| {
                let mut note = Note::from_draft(draft);
                while notes.iter().any(|existing| existing.id == note.id) {
                    note.id = Uuid::new_v4();
                }
                notes.push(note.clone());
                Ok(note)
            })
            .await?;
        debug!(id = %note.id, "note added");
        Ok(note)
    }

    /// Quick-create: title only, empty content, default tag.
    pub async fn add_quick(&self, title: impl Into<String>) -> RepoResult<Note> {
        self.add(NoteDraft::new(title, "", NoteTag::default())).await
    }

    /// Looks a note up by id. Absence is `Ok(None)`, never an error.
    pub async fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let envelope = self.read_tracked().await?;
        Ok(envelope.notes.into_iter().find(|note| note.id == id))
    }

    /// Full collection in insertion order. An absent key is an empty vec.
    pub async fn get_all(&self) -> RepoResult<Vec<Note>> {
        Ok(self.read_tracked().await?.notes)
    }

    /// Replaces title/content/tag of an existing note and refreshes its
    /// timestamp. The collection is untouched when the id has no match.
    pub async fn update(&self, id: NoteId, draft: NoteDraft) -> RepoResult<Note> {
        let note = self
            .mutate(|notes| {
                let note = notes
                    .iter_mut()
                    .find(|note| note.id == id)
                    .ok_or(RepoError::NotFound(id))?;
                note.title = draft.title;
                note.content = draft.content;
                note.tag = draft.tag;
                note.date = Utc::now();
                Ok(note.clone())
            })
            .await?;
        debug!(id = %note.id, "note updated");
        Ok(note)
    }

    /// Flips the pin flag. Pinning is not an edit, so `date` is untouched.
    pub async fn toggle_pin(&self, id: NoteId) -> RepoResult<Note> {
        self.mutate(|notes| {
            let note = notes
                .iter_mut()
                .find(|note| note.id == id)
                .ok_or(RepoError::NotFound(id))?;
            note.is_pinned = !note.is_pinned;
            Ok(note.clone())
        })
        .await
    }

    /// Removes the note with the given id. Returns whether a note was
    /// removed; the collection is rewritten either way.
    pub async fn delete(&self, id: NoteId) -> RepoResult<bool> {
        let removed = self
            .mutate(|notes| {
                let before = notes.len();
                notes.retain(|note| note.id != id);
                Ok(notes.len() != before)
            })
            .await?;
        debug!(%id, removed, "note delete applied");
        Ok(removed)
    }

    /// Drops the entire collection key. The next read resolves to an empty
    /// collection and the next mutation starts again at revision 1.
    pub async fn clear_all(&self) -> RepoResult<()> {
        let mut last_seen = self.gate.lock().await;
        self.store.remove(COLLECTION_KEY).await?;
        *last_seen = Some(0);
        debug!("note collection cleared");
        Ok(())
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<Note>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut last_seen = self.gate.lock().await;
        let mut envelope = self.read(&mut last_seen).await?;

        let value = apply(&mut envelope.notes)?;
        envelope.schema = SCHEMA_VERSION;
        envelope.revision += 1;
        self.write(&envelope).await?;
        *last_seen = Some(envelope.revision);
        Ok(value)
    }

    async fn read_tracked(&self) -> RepoResult<CollectionEnvelope> {
        let mut last_seen = self.gate.lock().await;
        let envelope = match self.store.get(COLLECTION_KEY).await? {
            Some(raw) => parse_collection(&raw)?,
            None => CollectionEnvelope::empty(),
        };
        *last_seen = Some(envelope.revision);
        Ok(envelope)
    }

    async fn read(&self, last_seen: &mut Option<u64>) -> RepoResult<CollectionEnvelope> {
        let envelope = match self.store.get(COLLECTION_KEY).await? {
            Some(raw) => parse_collection(&raw)?,
            None => CollectionEnvelope::empty(),
        };
        if let Some(expected) = *last_seen
            && envelope.revision != expected
        {
            let found = envelope.revision;
            // Resync so the caller can re-read and retry.
            *last_seen = Some(found);
            return Err(RepoError::StaleCollection { expected, found });
        }
        Ok(envelope)
    }

    async fn write(&self, envelope: &CollectionEnvelope) -> RepoResult<()> {
        let raw = serde_json::to_string(envelope)?;
        self.store.set(COLLECTION_KEY, &raw).await?;
        Ok(())
    }
}

fn parse_collection(raw: &str) -> Result<CollectionEnvelope, serde_json::Error> {
    match serde_json::from_str::<CollectionEnvelope>(raw) {
        Ok(envelope) => Ok(envelope),
        Err(envelope_error) => match serde_json::from_str::<Vec<Note>>(raw) {
            Ok(notes) => Ok(CollectionEnvelope {
                schema: SCHEMA_VERSION,
                revision: 0,
                notes,
            }),
            Err(_) => Err(envelope_error),
        },
    }
}
