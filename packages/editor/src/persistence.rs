//! # Persistence Coordinator
//!
//! Version and dirty-state bookkeeping for one editing session.
//!
//! This module is the synchronous half of load/save: it decides what to send,
//! and folds results back into state. The session performs the actual I/O
//! between `begin_*` and `finish_*` without holding any lock.
//!
//! ## State Machine
//!
//! ```text
//!            edit                        save ok
//!   Clean ─────────▶ Dirty ───────────────────────▶ Clean
//!     ▲                │ ▲
//!     │                │ └── save failed (error kept, edits kept)
//!     │                │
//!     │  remote newer, │ remote newer, local dirty
//!     └── local clean  └──▶ conflict warning (no reload)
//!         (reload)
//! ```
//!
//! Only this module writes the version counter and the dirty flag.

use pagecraft_blocks::StructuredContent;
use std::fmt;
use tracing::{debug, info, warn};

use crate::store::StoreError;

/// A newer remote version exists while local edits are unsaved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteConflict {
    pub local_version: u64,
    pub remote_version: u64,
}

/// Handle for one load in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub document_id: String,
    generation: u64,
}

/// Handle for one save in flight
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub document_id: String,
    pub content: StructuredContent,
    pub expected_version: u64,
    generation: u64,
}

/// What `begin_save` decided
#[derive(Debug, Clone, PartialEq)]
pub enum SaveTicket {
    /// Nothing loaded, nothing to save
    NotLoaded,
    /// A save is already running; it will pick this one up
    Queued,
    Ready(SaveRequest),
}

/// How a finished save was folded in
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResult {
    Saved { version: u64 },
    Failed(StoreError),
    /// The document was switched while the save ran; result ignored
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveCompletion {
    pub result: SaveResult,
    /// A queued save is waiting, there is still something to save and the
    /// finished save did not end in a version conflict
    pub run_queued: bool,
    /// A remote notification that arrived during the save, to re-check
    pub deferred_remote: Option<u64>,
}

/// What to do about a remote update notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    /// Not newer than what we have, or not our document
    Ignore,
    /// Local copy is clean; safe to reload
    Reload,
    /// Local copy is dirty; warn, never overwrite
    Conflict(RemoteConflict),
    /// A save is in flight; re-check once it lands
    Defer,
}

/// Version, dirty and error state of the loaded document
#[derive(Debug, Default)]
pub struct PersistenceState {
    document_id: Option<String>,
    version: u64,
    original: StructuredContent,
    dirty: bool,
    loading: bool,
    saving: bool,
    save_queued: bool,
    /// Bumped by every `begin_load`
    load_generation: u64,
    /// Bumped whenever a load is adopted
    document_generation: u64,
    deferred_remote: Option<u64>,
    last_error: Option<String>,
    conflict: Option<RemoteConflict>,
}

impl PersistenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Snapshot taken at the last successful load or save
    pub fn original(&self) -> &StructuredContent {
        &self.original
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn conflict(&self) -> Option<RemoteConflict> {
        self.conflict
    }

    /// Recompute dirtiness against the last saved snapshot
    pub fn refresh_dirty(&mut self, content: &StructuredContent) {
        self.dirty = *content != self.original;
    }

    /// Start a load. Any load already in flight becomes stale.
    pub fn begin_load(&mut self, document_id: &str) -> LoadTicket {
        self.load_generation += 1;
        self.loading = true;
        LoadTicket {
            document_id: document_id.to_string(),
            generation: self.load_generation,
        }
    }

    /// Adopt a loaded document. Returns false when a newer load superseded
    /// this one. A save still running against the previous document becomes
    /// stale.
    pub fn finish_load(&mut self, ticket: &LoadTicket, content: &StructuredContent, version: u64) -> bool {
        if ticket.generation != self.load_generation {
            debug!(document_id = %ticket.document_id, "Discarding superseded load");
            return false;
        }

        self.document_generation += 1;
        self.document_id = Some(ticket.document_id.clone());
        self.version = version;
        self.original = content.clone();
        self.dirty = false;
        self.loading = false;
        self.saving = false;
        self.save_queued = false;
        self.deferred_remote = None;
        self.last_error = None;
        self.conflict = None;

        info!(document_id = %ticket.document_id, version, "Document loaded");
        true
    }

    /// Record a failed load. Document state is left as it was.
    pub fn fail_load(&mut self, ticket: &LoadTicket, error: &impl fmt::Display) -> bool {
        if ticket.generation != self.load_generation {
            return false;
        }

        warn!(document_id = %ticket.document_id, error = %error, "Load failed");
        self.loading = false;
        self.last_error = Some(error.to_string());
        true
    }

    /// Decide whether a save can start now
    pub fn begin_save(&mut self, content: &StructuredContent) -> SaveTicket {
        let Some(document_id) = self.document_id.clone() else {
            return SaveTicket::NotLoaded;
        };

        if self.saving {
            self.save_queued = true;
            debug!(document_id = %document_id, "Save already in flight; queued");
            return SaveTicket::Queued;
        }

        self.saving = true;
        SaveTicket::Ready(SaveRequest {
            document_id,
            content: content.clone(),
            expected_version: self.version,
            generation: self.document_generation,
        })
    }

    /// Fold a save result back in. `current` is the live content, which may
    /// have moved on while the save was running.
    pub fn finish_save(
        &mut self,
        request: SaveRequest,
        outcome: Result<u64, StoreError>,
        current: &StructuredContent,
    ) -> SaveCompletion {
        if request.generation != self.document_generation {
            debug!(document_id = %request.document_id, "Discarding save result for replaced document");
            return SaveCompletion {
                result: SaveResult::Stale,
                run_queued: false,
                deferred_remote: None,
            };
        }

        self.saving = false;

        let result = match outcome {
            Ok(version) => {
                info!(document_id = %request.document_id, version, "Document saved");
                self.version = version;
                self.original = request.content;
                self.last_error = None;
                if self.conflict.map_or(false, |c| c.remote_version <= version) {
                    self.conflict = None;
                }
                SaveResult::Saved { version }
            }
            Err(error) => {
                warn!(document_id = %request.document_id, error = %error, "Save failed");
                if let StoreError::VersionConflict { current } = error {
                    self.conflict = Some(RemoteConflict {
                        local_version: self.version,
                        remote_version: current,
                    });
                }
                self.last_error = Some(error.to_string());
                SaveResult::Failed(error)
            }
        };

        self.refresh_dirty(current);

        // A conflict needs a reload or force save first; resending would only
        // hit the same conflict again
        let run_queued = std::mem::take(&mut self.save_queued)
            && self.dirty
            && !matches!(result, SaveResult::Failed(StoreError::VersionConflict { .. }));

        let deferred_remote = self
            .deferred_remote
            .take()
            .filter(|remote| *remote > self.version);

        SaveCompletion {
            result,
            run_queued,
            deferred_remote,
        }
    }

    /// Classify a remote "version changed" notification
    pub fn classify_remote(&mut self, document_id: &str, remote_version: u64) -> RemoteDecision {
        if self.document_id.as_deref() != Some(document_id) || remote_version <= self.version {
            return RemoteDecision::Ignore;
        }

        if self.saving {
            self.deferred_remote = Some(self.deferred_remote.map_or(remote_version, |v| v.max(remote_version)));
            return RemoteDecision::Defer;
        }

        if self.dirty {
            let conflict = RemoteConflict {
                local_version: self.version,
                remote_version,
            };
            warn!(
                document_id = %document_id,
                local_version = self.version,
                remote_version,
                "Remote update conflicts with unsaved local edits"
            );
            self.conflict = Some(conflict);
            return RemoteDecision::Conflict(conflict);
        }

        RemoteDecision::Reload
    }

    /// Adopt the store's version without loading its content, so the next
    /// save overwrites it. Only used by an explicit force save.
    pub fn override_version(&mut self, version: u64) {
        warn!(
            document_id = ?self.document_id,
            local_version = self.version,
            remote_version = version,
            "Overriding remote version"
        );
        self.version = version;
    }

    /// Skip an autosave tick when nothing is loaded, nothing changed, or a
    /// save or load is already running
    pub fn should_autosave(&self) -> bool {
        self.document_id.is_some() && self.dirty && !self.saving && !self.loading
    }
}
