//! # Editor Session
//!
//! One editing session over one page at a time.
//!
//! An `EditorSession` owns the document, its undo history, the selection and
//! the persistence state as a single unit behind one lock. Handles are cheap
//! to clone and all refer to the same session.
//!
//! Mutations, undo and redo are synchronous and never fail on stale ids or
//! indices. Load, save, remote updates and preview rendering are async; the
//! lock is never held across an `.await`.
//!
//! Background work (autosave, remote update watcher, debounced preview) only
//! holds weak references to the session and is torn down by [`EditorSession::close`]
//! or when the last handle is dropped.

use pagecraft_blocks::{
    create_default, BlockData, BlockPatch, BlockType, ContentBlock, GlobalSettings, PageMeta,
    StructuredContent,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::{EditorError, MutationError};
use crate::history::History;
use crate::mutations::{insert_after, Change, Mutation, SelectionChange};
use crate::persistence::{
    PersistenceState, RemoteConflict, RemoteDecision, SaveResult, SaveTicket,
};
use crate::preview::{PreviewOutput, PreviewSync};
use crate::store::{DocumentStore, PreviewRenderer, StoreError};

/// Notifications published to [`EditorSession::subscribe`] receivers
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The document changed through a mutation, undo or redo
    Changed,
    Loaded { document_id: String, version: u64 },
    LoadFailed { document_id: String, error: String },
    Saved { version: u64 },
    SaveFailed { error: String },
    /// A newer remote version exists while local edits are unsaved
    RemoteConflict(RemoteConflict),
    PreviewUpdated { seq: u64 },
    PreviewFailed { error: String },
}

/// Point-in-time view of the session for UI chrome
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub document_id: Option<String>,
    pub version: u64,
    pub is_dirty: bool,
    pub is_loading: bool,
    pub is_saving: bool,
    pub last_error: Option<String>,
    pub conflict: Option<RemoteConflict>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub selected_block: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { version: u64 },
    /// A later load finished first; this result was discarded
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { version: u64 },
    /// Another save is running and will send these edits once it lands,
    /// unless it fails on a version conflict (reported through
    /// [`EditorEvent::SaveFailed`] and [`SessionStatus::conflict`])
    Queued,
    NotLoaded,
    /// The document was replaced while the save ran
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteUpdateOutcome {
    Ignored,
    Reloaded { version: u64 },
    Conflict(RemoteConflict),
    /// Re-checked once the running save lands
    Deferred,
}

/// Everything guarded by the session lock
struct SessionState {
    document: Document,
    history: History,
    selection: Option<Uuid>,
    persistence: PersistenceState,
}

impl SessionState {
    /// Checkpoint, then apply a planned change
    fn commit(&mut self, change: Change) -> Result<(), MutationError> {
        if let Change::Blocks { blocks, .. } = &change {
            Document::validate_blocks(blocks)?;
        }

        self.history.checkpoint(self.document.content());

        match change {
            Change::Blocks { blocks, selection } => {
                self.document.replace_blocks(blocks)?;
                match selection {
                    SelectionChange::Keep => {}
                    SelectionChange::Select(id) => self.selection = Some(id),
                    SelectionChange::ClearIf(id) => {
                        if self.selection == Some(id) {
                            self.selection = None;
                        }
                    }
                }
            }
            Change::PageMeta(meta) => self.document.set_page_meta(meta),
            Change::GlobalSettings(settings) => self.document.set_global_settings(settings),
        }

        self.persistence.refresh_dirty(self.document.content());
        Ok(())
    }

    /// Swap in a history snapshot (undo/redo)
    fn restore(&mut self, content: StructuredContent) {
        self.document.restore(content);
        if let Some(selected) = self.selection {
            if self.document.block(selected).is_none() {
                self.selection = None;
            }
        }
        self.persistence.refresh_dirty(self.document.content());
    }
}

struct Inner {
    state: Mutex<SessionState>,
    store: Arc<dyn DocumentStore>,
    renderer: Option<Arc<dyn PreviewRenderer>>,
    preview: PreviewSync,
    config: EditorConfig,
    events: broadcast::Sender<EditorEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn emit(&self, event: EditorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Full-document render of the current content
    async fn render_preview(&self) -> Result<Option<String>, EditorError> {
        let Some(renderer) = self.renderer.clone() else {
            return Ok(None);
        };

        let snapshot = {
            let state = self.state();
            let snapshot = state
                .persistence
                .document_id()
                .map(|id| (id.to_string(), state.document.content().clone()));
            snapshot
        };
        let Some((document_id, content)) = snapshot else {
            return Ok(None);
        };

        let seq = self.preview.begin_render();
        debug!(document_id = %document_id, seq, "Rendering preview");

        match renderer.render_preview(&document_id, &content).await {
            Ok(html) => {
                if self.preview.complete(seq, Ok(html.clone())) {
                    self.emit(EditorEvent::PreviewUpdated { seq });
                }
                Ok(Some(html))
            }
            Err(error) => {
                warn!(document_id = %document_id, error = %error, "Preview render failed");
                if self.preview.complete(seq, Err(error.to_string())) {
                    self.emit(EditorEvent::PreviewFailed {
                        error: error.to_string(),
                    });
                }
                Err(error.into())
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for task in self.tasks().drain(..) {
            task.abort();
        }
    }
}

/// Handle to an editing session
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<Inner>,
}

impl EditorSession {
    /// Session without a preview renderer
    pub fn new(store: Arc<dyn DocumentStore>, config: EditorConfig) -> Self {
        Self::build(store, None, config)
    }

    pub fn with_renderer(
        store: Arc<dyn DocumentStore>,
        renderer: Arc<dyn PreviewRenderer>,
        config: EditorConfig,
    ) -> Self {
        Self::build(store, Some(renderer), config)
    }

    fn build(
        store: Arc<dyn DocumentStore>,
        renderer: Option<Arc<dyn PreviewRenderer>>,
        config: EditorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let state = SessionState {
            document: Document::empty(),
            history: History::new(config.history_limit),
            selection: None,
            persistence: PersistenceState::new(),
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                store,
                renderer,
                preview: PreviewSync::new(config.preview_debounce()),
                config,
                events,
                tasks: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.inner.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Copy of the current document
    pub fn document(&self) -> Document {
        self.inner.state().document.clone()
    }

    pub fn content(&self) -> StructuredContent {
        self.inner.state().document.content().clone()
    }

    pub fn blocks(&self) -> Vec<ContentBlock> {
        self.inner.state().document.blocks().to_vec()
    }

    pub fn block(&self, id: Uuid) -> Option<ContentBlock> {
        self.inner.state().document.block(id).cloned()
    }

    pub fn selected_block(&self) -> Option<Uuid> {
        self.inner.state().selection
    }

    pub fn preview_output(&self) -> PreviewOutput {
        self.inner.preview.output().clone()
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.inner.state();
        SessionStatus {
            document_id: state.persistence.document_id().map(str::to_string),
            version: state.persistence.version(),
            is_dirty: state.persistence.is_dirty(),
            is_loading: state.persistence.is_loading(),
            is_saving: state.persistence.is_saving(),
            last_error: state.persistence.last_error().map(str::to_string),
            conflict: state.persistence.conflict(),
            can_undo: state.history.can_undo(),
            can_redo: state.history.can_redo(),
            selected_block: state.selection,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Apply a mutation. `Ok(false)` means it addressed something that no
    /// longer exists and nothing changed.
    pub fn apply(&self, mutation: Mutation) -> Result<bool, MutationError> {
        {
            let mut state = self.inner.state();
            let Some(change) = mutation.plan(&state.document)? else {
                trace!(mutation = mutation.name(), "Mutation target missing; ignored");
                return Ok(false);
            };
            state.commit(change)?;
        }

        debug!(mutation = mutation.name(), "Applied mutation");
        self.changed();
        Ok(true)
    }

    /// Insert a default block after `after_id` (or at the end) and select it
    pub fn add_block(&self, block_type: BlockType, after_id: Option<Uuid>) -> Uuid {
        let block = create_default(block_type, 0);
        let id = block.id();

        let committed = {
            let mut state = self.inner.state();
            let change = insert_after(&state.document, block, after_id);
            state.commit(change)
        };

        match committed {
            Ok(()) => {
                debug!(block_id = %id, block_type = %block_type, "Added block");
                self.changed();
            }
            Err(error) => warn!(error = %error, "Failed to add block"),
        }
        id
    }

    pub fn delete_block(&self, id: Uuid) -> bool {
        self.apply_structural(Mutation::DeleteBlock { id })
    }

    pub fn move_block(&self, from: usize, to: usize) -> bool {
        self.apply_structural(Mutation::MoveBlock { from, to })
    }

    pub fn duplicate_block(&self, id: Uuid) -> bool {
        self.apply_structural(Mutation::DuplicateBlock { id })
    }

    /// Shallow-merge fields into a block
    pub fn update_block(&self, id: Uuid, patch: BlockPatch) -> Result<bool, MutationError> {
        self.apply(Mutation::UpdateBlock { id, patch })
    }

    /// Replace a block's payload from hand-edited JSON. Malformed JSON or a
    /// different block type is rejected and nothing is applied.
    pub fn replace_block_json(&self, id: Uuid, json: &str) -> Result<bool, MutationError> {
        let data = BlockData::from_json(json)?;
        self.apply(Mutation::ReplaceBlockData { id, data })
    }

    pub fn update_page_meta(&self, meta: PageMeta) -> bool {
        self.apply_structural(Mutation::UpdatePageMeta { meta })
    }

    pub fn update_global_settings(&self, settings: GlobalSettings) -> bool {
        self.apply_structural(Mutation::UpdateGlobalSettings { settings })
    }

    /// Select a block, or clear the selection with `None`. Unknown ids are
    /// ignored.
    pub fn select_block(&self, id: Option<Uuid>) -> bool {
        let mut state = self.inner.state();
        match id {
            Some(id) if state.document.block(id).is_none() => false,
            _ => {
                state.selection = id;
                true
            }
        }
    }

    pub fn undo(&self) -> bool {
        let undone = {
            let mut guard = self.inner.state();
            let state = &mut *guard;
            match state.history.undo(state.document.content()) {
                Some(previous) => {
                    state.restore(previous);
                    true
                }
                None => false,
            }
        };

        if undone {
            debug!("Undo");
            self.changed();
        }
        undone
    }

    pub fn redo(&self) -> bool {
        let redone = {
            let mut state = self.inner.state();
            match state.history.redo() {
                Some(next) => {
                    state.restore(next);
                    true
                }
                None => false,
            }
        };

        if redone {
            debug!("Redo");
            self.changed();
        }
        redone
    }

    /// Mutations that can only fail on an internal invariant break
    fn apply_structural(&self, mutation: Mutation) -> bool {
        let name = mutation.name();
        self.apply(mutation).unwrap_or_else(|error| {
            warn!(mutation = name, error = %error, "Mutation rejected");
            false
        })
    }

    fn changed(&self) {
        self.inner.emit(EditorEvent::Changed);
        self.request_preview();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Load a document, replacing the current one wholesale. History is reset
    /// to the loaded state. On failure the previous document stays as it was.
    #[instrument(skip(self))]
    pub async fn load_content(&self, document_id: &str) -> Result<LoadOutcome, EditorError> {
        let ticket = self.inner.state().persistence.begin_load(document_id);

        let loaded = match self.inner.store.load_document(document_id).await {
            Ok((content, version)) => Document::from_content(content)
                .map(|document| (document, version))
                .map_err(EditorError::from),
            Err(error) => Err(EditorError::from(error)),
        };

        let (document, version) = match loaded {
            Ok(loaded) => loaded,
            Err(error) => {
                let current = self.inner.state().persistence.fail_load(&ticket, &error);
                if !current {
                    return Ok(LoadOutcome::Superseded);
                }
                self.inner.emit(EditorEvent::LoadFailed {
                    document_id: document_id.to_string(),
                    error: error.to_string(),
                });
                return Err(error);
            }
        };

        let adopted = {
            let mut state = self.inner.state();
            let adopted = state
                .persistence
                .finish_load(&ticket, document.content(), version);
            if adopted {
                state.history.reset(document.content());
                state.document = document;
                state.selection = None;
            }
            adopted
        };

        if !adopted {
            return Ok(LoadOutcome::Superseded);
        }

        self.inner.preview.cancel();
        self.inner.preview.clear();
        self.inner.emit(EditorEvent::Loaded {
            document_id: document_id.to_string(),
            version,
        });
        self.spawn_initial_preview();

        Ok(LoadOutcome::Loaded { version })
    }

    /// Discard local edits and load the current document again
    pub async fn reload(&self) -> Result<LoadOutcome, EditorError> {
        let document_id = self
            .inner
            .state()
            .persistence
            .document_id()
            .map(str::to_string)
            .ok_or(EditorError::NoDocumentLoaded)?;

        info!(document_id = %document_id, "Reloading document");
        self.load_content(&document_id).await
    }

    /// Compare-and-swap save of the current content. A save requested while
    /// another is running is queued and sent by the running one, also after
    /// a failed attempt unless that failure was a version conflict.
    #[instrument(skip(self))]
    pub async fn save_content(&self) -> Result<SaveOutcome, EditorError> {
        let ticket = {
            let mut guard = self.inner.state();
            let state = &mut *guard;
            state.persistence.begin_save(state.document.content())
        };

        let mut request = match ticket {
            SaveTicket::NotLoaded => {
                trace!("Nothing loaded; save skipped");
                return Ok(SaveOutcome::NotLoaded);
            }
            SaveTicket::Queued => return Ok(SaveOutcome::Queued),
            SaveTicket::Ready(request) => request,
        };

        loop {
            let document_id = request.document_id.clone();
            let outcome = self
                .inner
                .store
                .save_document(&document_id, &request.content, request.expected_version)
                .await;

            let (completion, next) = {
                let mut guard = self.inner.state();
                let state = &mut *guard;
                let completion = state
                    .persistence
                    .finish_save(request, outcome, state.document.content());
                let next = if completion.run_queued {
                    Some(state.persistence.begin_save(state.document.content()))
                } else {
                    None
                };
                (completion, next)
            };

            if let Some(remote_version) = completion.deferred_remote {
                if let Err(error) = self.on_remote_update(&document_id, remote_version).await {
                    warn!(error = %error, "Deferred remote update failed");
                }
            }

            match completion.result {
                SaveResult::Saved { version } => {
                    self.inner.emit(EditorEvent::Saved { version });
                    match next {
                        Some(SaveTicket::Ready(queued)) => {
                            debug!("Sending queued save");
                            request = queued;
                        }
                        _ => return Ok(SaveOutcome::Saved { version }),
                    }
                }
                SaveResult::Failed(error) => {
                    self.inner.emit(EditorEvent::SaveFailed {
                        error: error.to_string(),
                    });
                    match next {
                        Some(SaveTicket::Ready(queued)) => {
                            debug!(error = %error, "Save failed; sending queued save");
                            request = queued;
                        }
                        _ => return Err(error.into()),
                    }
                }
                SaveResult::Stale => return Ok(SaveOutcome::Superseded),
            }
        }
    }

    /// Save, overwriting a newer remote version if the store reports a
    /// conflict
    #[instrument(skip(self))]
    pub async fn force_save_content(&self) -> Result<SaveOutcome, EditorError> {
        match self.save_content().await {
            Err(EditorError::Store(StoreError::VersionConflict { current })) => {
                self.inner.state().persistence.override_version(current);
                self.save_content().await
            }
            other => other,
        }
    }

    /// Handle a "document changed remotely" notification. Stale and duplicate
    /// notifications are ignored; a newer version reloads a clean document
    /// and raises a conflict on a dirty one.
    #[instrument(skip(self))]
    pub async fn on_remote_update(
        &self,
        document_id: &str,
        remote_version: u64,
    ) -> Result<RemoteUpdateOutcome, EditorError> {
        let decision = self
            .inner
            .state()
            .persistence
            .classify_remote(document_id, remote_version);

        match decision {
            RemoteDecision::Ignore => {
                trace!("Remote update not newer; ignored");
                Ok(RemoteUpdateOutcome::Ignored)
            }
            RemoteDecision::Defer => {
                debug!("Save in flight; remote update deferred");
                Ok(RemoteUpdateOutcome::Deferred)
            }
            RemoteDecision::Conflict(conflict) => {
                self.inner.emit(EditorEvent::RemoteConflict(conflict));
                Ok(RemoteUpdateOutcome::Conflict(conflict))
            }
            RemoteDecision::Reload => match self.load_content(document_id).await? {
                LoadOutcome::Loaded { version } => Ok(RemoteUpdateOutcome::Reloaded { version }),
                LoadOutcome::Superseded => Ok(RemoteUpdateOutcome::Ignored),
            },
        }
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    /// Debounced preview request. Returns false when nothing was scheduled
    /// (no renderer, no runtime or a closed session).
    pub fn request_preview(&self) -> bool {
        if self.inner.renderer.is_none() || self.inner.is_closed() {
            return false;
        }

        let session = Arc::downgrade(&self.inner);
        self.inner.preview.schedule(move || async move {
            let Some(inner) = session.upgrade().filter(|inner| !inner.is_closed()) else {
                return;
            };
            if let Err(error) = inner.render_preview().await {
                debug!(error = %error, "Debounced preview failed");
            }
        })
    }

    /// Render immediately, dropping any pending debounced request.
    /// `Ok(None)` when there is no renderer or no document.
    pub async fn refresh_preview(&self) -> Result<Option<String>, EditorError> {
        self.inner.preview.cancel();
        self.inner.render_preview().await
    }

    fn spawn_initial_preview(&self) {
        if self.inner.renderer.is_none() || self.inner.is_closed() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            return;
        };

        let session = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            let Some(inner) = session.upgrade().filter(|inner| !inner.is_closed()) else {
                return;
            };
            if let Err(error) = inner.render_preview().await {
                debug!(error = %error, "Initial preview failed");
            }
        });
        self.inner.track(task);
    }

    // ------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------

    /// Save on a fixed interval. Ticks are skipped while nothing is dirty or
    /// a save is already running. Returns false when autosave is disabled,
    /// there is no runtime or the session is closed.
    pub fn start_autosave(&self) -> bool {
        if self.inner.is_closed() {
            return false;
        }
        let Some(period) = self.inner.config.autosave_interval() else {
            return false;
        };
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };

        let session = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = session.upgrade() else {
                    break;
                };
                let editor = EditorSession { inner };

                let due = editor.inner.state().persistence.should_autosave();
                if !due {
                    trace!("Autosave tick skipped");
                    continue;
                }

                if let Err(error) = editor.save_content().await {
                    warn!(error = %error, "Autosave failed");
                }
            }
        });

        self.inner.track(task);
        info!(interval_ms = period.as_millis() as u64, "Autosave started");
        true
    }

    /// Follow the store's remote update feed. Returns false when there is
    /// no runtime or the session is closed.
    pub fn watch_remote_updates(&self) -> bool {
        if self.inner.is_closed() {
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };

        let mut updates = self.inner.store.remote_updates();
        let session = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            loop {
                let update = match updates.recv().await {
                    Ok(update) => update,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Remote update feed lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let Some(inner) = session.upgrade() else {
                    break;
                };
                let editor = EditorSession { inner };

                if let Err(error) = editor
                    .on_remote_update(&update.document_id, update.version)
                    .await
                {
                    warn!(error = %error, "Remote update handling failed");
                }
            }
        });

        self.inner.track(task);
        true
    }

    /// Stop background tasks and drop any pending preview. A closed session
    /// still accepts edits and explicit load/save calls but starts no more
    /// background work.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.preview.cancel();
        for task in self.inner.tasks().drain(..) {
            task.abort();
        }
        info!("Editor session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn seeded_store(types: &[BlockType], version: u64) -> Arc<MemoryStore> {
        let mut content = StructuredContent::new(
            "review",
            PageMeta {
                title: "Best Headphones".to_string(),
                ..PageMeta::default()
            },
        );
        content.blocks = types
            .iter()
            .enumerate()
            .map(|(i, t)| create_default(*t, i as u32))
            .collect();

        let store = Arc::new(MemoryStore::new());
        store.insert("page-1", content, version);
        store
    }

    fn session_for(store: &Arc<MemoryStore>) -> EditorSession {
        EditorSession::new(store.clone(), EditorConfig::default())
    }

    #[test]
    fn test_closed_session_starts_no_background_work() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        session.close();

        assert!(!session.start_autosave());
        assert!(!session.watch_remote_updates());
        assert!(!session.request_preview());
    }

    #[test]
    fn test_mutations_without_runtime() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());

        let intro = session.add_block(BlockType::Intro, None);
        let faq = session.add_block(BlockType::Faq, None);

        assert_eq!(session.selected_block(), Some(faq));
        assert!(session.move_block(1, 0));
        assert_eq!(session.blocks()[1].id(), intro);

        assert!(session.undo());
        assert_eq!(session.blocks()[0].id(), intro);
        assert!(session.redo());
        assert_eq!(session.blocks()[0].id(), faq);
    }

    #[test]
    fn test_delete_clears_selection() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        let id = session.add_block(BlockType::Hero, None);
        assert_eq!(session.selected_block(), Some(id));

        assert!(session.delete_block(id));
        assert_eq!(session.selected_block(), None);
        assert!(!session.delete_block(id));
    }

    #[test]
    fn test_select_unknown_block_is_ignored() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        let id = session.add_block(BlockType::Quote, None);
        session.select_block(None);

        assert!(!session.select_block(Some(Uuid::new_v4())));
        assert_eq!(session.selected_block(), None);
        assert!(session.select_block(Some(id)));
        assert_eq!(session.selected_block(), Some(id));
    }

    #[test]
    fn test_undo_drops_selection_of_vanished_block() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        session.add_block(BlockType::Intro, None);
        let added = session.add_block(BlockType::Faq, None);

        assert!(session.undo());
        assert!(session.block(added).is_none());
        assert_eq!(session.selected_block(), None);
    }

    #[test]
    fn test_replace_block_json_rejects_type_change() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        let id = session.add_block(BlockType::Intro, None);
        let before = session.content();

        let result = session.replace_block_json(id, r#"{"type": "hero", "headline": "x", "subheadline": "y"}"#);
        assert!(matches!(result, Err(MutationError::Payload(_))));

        let result = session.replace_block_json(id, "{ not json");
        assert!(matches!(result, Err(MutationError::Payload(_))));

        assert_eq!(session.content(), before);
    }

    #[tokio::test]
    async fn test_load_resets_history_and_status() {
        let store = seeded_store(&[BlockType::Intro, BlockType::Conclusion], 3);
        let session = session_for(&store);
        session.add_block(BlockType::Faq, None);

        let outcome = session.load_content("page-1").await.unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded { version: 3 });
        let status = session.status();
        assert_eq!(status.document_id.as_deref(), Some("page-1"));
        assert_eq!(status.version, 3);
        assert!(!status.is_dirty);
        assert!(!status.can_undo);
        assert_eq!(status.selected_block, None);
        assert_eq!(session.blocks().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_document() {
        let store = seeded_store(&[BlockType::Intro], 1);
        let session = session_for(&store);
        session.load_content("page-1").await.unwrap();
        let before = session.content();

        let result = session.load_content("missing").await;

        assert!(matches!(result, Err(EditorError::Store(StoreError::NotFound(_)))));
        assert_eq!(session.content(), before);
        let status = session.status();
        assert_eq!(status.document_id.as_deref(), Some("page-1"));
        assert!(!status.is_loading);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_save_then_edit_back_to_saved_state_is_clean() {
        let store = seeded_store(&[BlockType::Intro], 1);
        let session = session_for(&store);
        session.load_content("page-1").await.unwrap();

        let id = session.add_block(BlockType::Faq, None);
        assert!(session.status().is_dirty);

        session.delete_block(id);
        assert!(!session.status().is_dirty);
    }

    #[tokio::test]
    async fn test_save_without_document() {
        let session = EditorSession::new(Arc::new(MemoryStore::new()), EditorConfig::default());
        assert_eq!(session.save_content().await.unwrap(), SaveOutcome::NotLoaded);
        assert!(matches!(session.reload().await, Err(EditorError::NoDocumentLoaded)));
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let store = seeded_store(&[BlockType::Intro], 1);
        let session = session_for(&store);
        let mut events = session.subscribe();

        session.load_content("page-1").await.unwrap();
        session.add_block(BlockType::Faq, None);
        session.save_content().await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            EditorEvent::Loaded {
                document_id: "page-1".to_string(),
                version: 1
            }
        );
        assert_eq!(events.recv().await.unwrap(), EditorEvent::Changed);
        assert_eq!(events.recv().await.unwrap(), EditorEvent::Saved { version: 2 });
    }

    #[tokio::test]
    async fn test_force_save_overwrites_newer_remote() {
        let store = seeded_store(&[BlockType::Intro], 1);
        let session = session_for(&store);
        session.load_content("page-1").await.unwrap();

        store.write_remote("page-1", StructuredContent::default());
        session.add_block(BlockType::Faq, None);

        assert!(matches!(
            session.save_content().await,
            Err(EditorError::Store(StoreError::VersionConflict { current: 2 }))
        ));

        let outcome = session.force_save_content().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { version: 3 });
        assert_eq!(store.content("page-1").unwrap(), session.content());
        assert_eq!(session.status().conflict, None);
    }
}
