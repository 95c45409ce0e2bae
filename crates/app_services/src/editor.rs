//! Debounced auto-save for the note editor.
//!
//! Every staged draft replaces the pending one and resets the quiet-period
//! timer; only the state as of the last pause is persisted. Closing the
//! session drops any pending draft (unmount semantics) but never interrupts
//! a save that already started.

use std::sync::Arc;
use std::time::Duration;

use core_types::{NoteDraft, NoteId};
use note_store::NoteRepository;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);

enum Command {
    Stage(NoteDraft),
    Flush(oneshot::Sender<()>),
}

/// Auto-save session for one note. Dropping it without `close` leaves the
/// worker to wind down on its own; pending edits are not saved.
pub struct EditorSession {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl EditorSession {
    pub fn new(repo: Arc<NoteRepository>, id: NoteId, quiet_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(repo, id, quiet_period, rx));
        Self { tx, worker }
    }

    /// Replaces the pending draft and restarts the quiet-period timer.
    pub fn stage(&self, draft: NoteDraft) {
        let _ = self.tx.send(Command::Stage(draft));
    }

    /// Persists the pending draft immediately (the explicit save button).
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Ends the session, cancelling any pending (unsaved) draft. A save
    /// already in flight completes before the worker exits.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

async fn run_worker(
    repo: Arc<NoteRepository>,
    id: NoteId,
    quiet_period: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<NoteDraft> = None;

    loop {
        let command = if pending.is_some() {
            match timeout(quiet_period, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    save(&repo, id, &mut pending).await;
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Stage(draft)) => pending = Some(draft),
            Some(Command::Flush(ack)) => {
                save(&repo, id, &mut pending).await;
                let _ = ack.send(());
            }
            // Sender dropped: the editor went away, pending edits with it.
            None => break,
        }
    }
}

async fn save(repo: &NoteRepository, id: NoteId, pending: &mut Option<NoteDraft>) {
    let Some(draft) = pending.take() else {
        return;
    };
    match repo.update(id, draft).await {
        Ok(_) => debug!(%id, "auto-save persisted"),
        Err(error) => warn!(%id, %error, "auto-save failed"),
    }
}

#[cfg(test)]
mod tests {
    use core_types::KvStore;
    use core_types::NoteTag;
    use storage_fs::MemoryKvStore;

    use super::*;

    async fn seeded_repo() -> (Arc<MemoryKvStore>, Arc<NoteRepository>, NoteId) {
        let store = Arc::new(MemoryKvStore::new());
        let repo = Arc::new(NoteRepository::new(store.clone()));
        let note = repo
            .add(NoteDraft::new("draft", "v0", NoteTag::Personal))
            .await
            .expect("seed note");
        (store, repo, note.id)
    }

    async fn stored_revision(store: &MemoryKvStore) -> u64 {
        let raw = store
            .get("NOTES")
            .await
            .expect("raw get")
            .expect("collection present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse envelope");
        value["revision"].as_u64().expect("revision field")
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_save_with_the_final_draft() {
        let (store, repo, id) = seeded_repo().await;
        let session = EditorSession::new(repo.clone(), id, DEFAULT_QUIET_PERIOD);

        session.stage(NoteDraft::new("draft", "v1", NoteTag::Personal));
        session.stage(NoteDraft::new("draft", "v2", NoteTag::Personal));
        session.stage(NoteDraft::new("Final title", "v3", NoteTag::Work));

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        let note = repo
            .get_by_id(id)
            .await
            .expect("get")
            .expect("still present");
        assert_eq!(note.title, "Final title");
        assert_eq!(note.content, "v3");
        assert_eq!(note.tag, NoteTag::Work);

        // Seed add was revision 1; the three staged edits landed as one.
        assert_eq!(stored_revision(&store).await, 2);

        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn closing_before_the_quiet_period_discards_the_pending_draft() {
        let (store, repo, id) = seeded_repo().await;
        let session = EditorSession::new(repo.clone(), id, DEFAULT_QUIET_PERIOD);

        session.stage(NoteDraft::new("never saved", "x", NoteTag::Personal));
        session.close().await;

        let note = repo
            .get_by_id(id)
            .await
            .expect("get")
            .expect("still present");
        assert_eq!(note.title, "draft");
        assert_eq!(note.content, "v0");
        assert_eq!(stored_revision(&store).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_without_waiting_for_the_timer() {
        let (store, repo, id) = seeded_repo().await;
        let session = EditorSession::new(repo.clone(), id, DEFAULT_QUIET_PERIOD);

        session.stage(NoteDraft::new("saved now", "y", NoteTag::Ideas));
        session.flush().await;

        let note = repo
            .get_by_id(id)
            .await
            .expect("get")
            .expect("still present");
        assert_eq!(note.title, "saved now");
        assert_eq!(stored_revision(&store).await, 2);

        // Flushing with nothing pending is a no-op.
        session.flush().await;
        assert_eq!(stored_revision(&store).await, 2);

        session.close().await;
    }
}
