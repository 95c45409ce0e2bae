//! Composition root. Builds the store and every state holder once and hands
//! out a cloneable handle; consumers never construct these pieces themselves.

pub mod editor;

pub use editor::{DEFAULT_QUIET_PERIOD, EditorSession};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use auth::AuthManager;
use core_types::{KvStore, Note, NoteDraft, NoteId, NoteTag, SortMode, TagFilter};
use note_store::{NoteRepository, NoteView};
use prefs::{SettingsStore, ThemeState};
use storage_fs::FsKvStore;
use tracing::{info, warn};

pub struct AppServicesBuilder {
    data_dir: PathBuf,
    device_dark: bool,
}

impl AppServicesBuilder {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            device_dark: false,
        }
    }

    /// Device appearance at launch; only matters while the theme preference
    /// is `System`.
    pub fn device_dark(mut self, device_dark: bool) -> Self {
        self.device_dark = device_dark;
        self
    }

    pub async fn build(self) -> Result<AppServices> {
        let store: Arc<dyn KvStore> = Arc::new(FsKvStore::new(self.data_dir.join("storage")));
        AppServices::assemble(store, self.device_dark).await
    }
}

#[derive(Clone)]
pub struct AppServices {
    notes: Arc<NoteRepository>,
    theme: Arc<ThemeState>,
    auth: Arc<AuthManager>,
    settings: SettingsStore,
}

impl AppServices {
    /// Wires the state holders onto an existing store. Useful directly in
    /// tests; `AppServicesBuilder` is the production path.
    pub async fn assemble(store: Arc<dyn KvStore>, device_dark: bool) -> Result<Self> {
        let notes = Arc::new(NoteRepository::new(store.clone()));
        if let Err(error) = notes.init().await {
            // Not fatal: the next mutation recreates the collection key.
            warn!(%error, "note collection init failed, continuing");
        }

        let theme = Arc::new(
            ThemeState::load(store.clone(), device_dark)
                .await
                .context("load theme preference")?,
        );
        let auth = Arc::new(AuthManager::new(store.clone()));
        let settings = SettingsStore::new(store);

        Ok(Self {
            notes,
            theme,
            auth,
            settings,
        })
    }

    pub fn notes(&self) -> &NoteRepository {
        &self.notes
    }

    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Display-ready list: tag filter, then search, then sort, over the full
    /// collection.
    pub async fn note_view(
        &self,
        tag_filter: TagFilter,
        search: &str,
        sort: SortMode,
    ) -> Result<Vec<Note>> {
        let all = self.notes.get_all().await?;
        Ok(NoteView::new(tag_filter, search, sort).apply(&all))
    }

    /// Opens an auto-saving editor session for an existing note.
    pub fn open_editor(&self, id: NoteId) -> EditorSession {
        EditorSession::new(self.notes.clone(), id, DEFAULT_QUIET_PERIOD)
    }

    /// First-run fixtures so the list screen is not empty. No-op when the
    /// user already has notes.
    pub async fn seed_demo_notes(&self) -> Result<usize> {
        if !self.notes.get_all().await?.is_empty() {
            return Ok(0);
        }

        let fixtures = [
            NoteDraft::new(
                "Welcome to Noteleaf",
                "Tap the pencil to start a note. Pin anything you want on top.",
                NoteTag::Personal,
            ),
            NoteDraft::new(
                "Grocery run",
                "milk, eggs, coffee beans",
                NoteTag::Tasks,
            ),
            NoteDraft::new(
                "Side project ideas",
                "habit tracker, plant watering reminders",
                NoteTag::Ideas,
            ),
        ];

        let mut seeded = 0;
        for draft in fixtures {
            self.notes.add(draft).await?;
            seeded += 1;
        }
        info!(seeded, "seeded demo notes");
        Ok(seeded)
    }

    /// One-line status for the shell log.
    pub async fn startup_summary(&self) -> String {
        let notes = self
            .notes
            .get_all()
            .await
            .map(|notes| notes.len())
            .unwrap_or(0);
        let theme = if self.theme.is_dark_mode() {
            "dark"
        } else {
            "light"
        };
        format!(
            "Core ready: {} notes, signed_in:{}, theme:{}",
            notes,
            self.auth.is_signed_in(),
            theme
        )
    }
}

#[cfg(test)]
mod tests {
    use storage_fs::MemoryKvStore;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn builds_against_a_data_dir_and_persists_across_restarts() {
        let dir = tempdir().expect("tempdir");

        let services = AppServicesBuilder::new(dir.path())
            .build()
            .await
            .expect("build services");
        services
            .notes()
            .add(NoteDraft::new("Durable", "", NoteTag::Personal))
            .await
            .expect("add note");

        let reopened = AppServicesBuilder::new(dir.path())
            .build()
            .await
            .expect("rebuild services");
        let notes = reopened.notes().get_all().await.expect("list");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Durable");
    }

    #[tokio::test]
    async fn note_view_composes_over_the_live_collection() {
        let services = AppServices::assemble(Arc::new(MemoryKvStore::new()), false)
            .await
            .expect("assemble");

        services
            .notes()
            .add(NoteDraft::new("Groceries", "milk", NoteTag::Personal))
            .await
            .expect("add");
        services
            .notes()
            .add(NoteDraft::new("Budget review", "numbers", NoteTag::Work))
            .await
            .expect("add");

        let work = services
            .note_view(TagFilter::Tag(NoteTag::Work), "", SortMode::NewestFirst)
            .await
            .expect("view");
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].title, "Budget review");

        let hits = services
            .note_view(TagFilter::All, "MILK", SortMode::Alphabetical)
            .await
            .expect("search view");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Groceries");
    }

    #[tokio::test]
    async fn demo_seed_runs_once() {
        let services = AppServices::assemble(Arc::new(MemoryKvStore::new()), false)
            .await
            .expect("assemble");

        let seeded = services.seed_demo_notes().await.expect("seed");
        assert!(seeded > 0);
        let again = services.seed_demo_notes().await.expect("re-seed");
        assert_eq!(again, 0);
        assert_eq!(
            services.notes().get_all().await.expect("list").len(),
            seeded
        );
    }

    #[tokio::test]
    async fn startup_summary_reflects_state() {
        let services = AppServices::assemble(Arc::new(MemoryKvStore::new()), true)
            .await
            .expect("assemble");
        let summary = services.startup_summary().await;
        assert!(summary.contains("0 notes"));
        assert!(summary.contains("signed_in:false"));
        assert!(summary.contains("theme:dark"));
    }
}
