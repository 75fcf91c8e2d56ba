//! # Remote Store Boundary
//!
//! The engine persists nothing itself. It talks to a versioned remote copy
//! of each document through [`DocumentStore`] and asks a [`PreviewRenderer`]
//! for rendered HTML. Transport (HTTP, WebSocket, ...) is the implementor's
//! business.
//!
//! [`MemoryStore`] is a complete in-process implementation with
//! compare-and-swap saves and a broadcast update feed, used by tests and
//! embedders that have no backend yet.

use async_trait::async_trait;
use pagecraft_blocks::StructuredContent;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

const UPDATE_FEED_CAPACITY: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Version conflict: store is at version {current}")]
    VersionConflict { current: u64 },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Push notification that a document changed remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub document_id: String,
    pub version: u64,
}

/// Versioned document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document and its current version
    async fn load_document(&self, id: &str) -> Result<(StructuredContent, u64), StoreError>;

    /// Compare-and-swap save. Succeeds only when the store is still at
    /// `expected_version`; returns the new version.
    async fn save_document(
        &self,
        id: &str,
        content: &StructuredContent,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Feed of remote changes. Delivery is best effort: notifications may be
    /// duplicated, reordered or dropped.
    fn remote_updates(&self) -> broadcast::Receiver<RemoteUpdate>;
}

/// Turns a document into preview HTML
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_preview(&self, id: &str, content: &StructuredContent) -> Result<String, StoreError>;
}

/// In-memory [`DocumentStore`]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, (StructuredContent, u64)>>,
    updates: broadcast::Sender<RemoteUpdate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_FEED_CAPACITY);
        Self {
            documents: Mutex::new(HashMap::new()),
            updates,
        }
    }

    /// Seed a document at a given version (no notification)
    pub fn insert(&self, id: impl Into<String>, content: StructuredContent, version: u64) {
        self.documents().insert(id.into(), (content, version));
    }

    pub fn version(&self, id: &str) -> Option<u64> {
        self.documents().get(id).map(|(_, version)| *version)
    }

    pub fn content(&self, id: &str) -> Option<StructuredContent> {
        self.documents().get(id).map(|(content, _)| content.clone())
    }

    /// Simulate another writer: store `content` as the next version and
    /// notify subscribers. Returns the new version.
    pub fn write_remote(&self, id: &str, content: StructuredContent) -> u64 {
        let version = {
            let mut documents = self.documents();
            let entry = documents.entry(id.to_string()).or_insert_with(|| (StructuredContent::default(), 0));
            entry.0 = content;
            entry.1 += 1;
            entry.1
        };
        self.notify(id, version);
        version
    }

    /// Send a notification without changing anything (e.g. to replay a
    /// duplicate)
    pub fn notify(&self, id: &str, version: u64) {
        // No subscribers is fine
        let _ = self.updates.send(RemoteUpdate {
            document_id: id.to_string(),
            version,
        });
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<String, (StructuredContent, u64)>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_document(&self, id: &str) -> Result<(StructuredContent, u64), StoreError> {
        self.documents()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_document(
        &self,
        id: &str,
        content: &StructuredContent,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let version = {
            let mut documents = self.documents();
            let entry = documents
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            if entry.1 != expected_version {
                return Err(StoreError::VersionConflict { current: entry.1 });
            }

            entry.0 = content.clone();
            entry.1 += 1;
            entry.1
        };

        debug!(document_id = %id, version, "Memory store saved document");
        self.notify(id, version);
        Ok(version)
    }

    fn remote_updates(&self) -> broadcast::Receiver<RemoteUpdate> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_and_swap_save() {
        let store = MemoryStore::new();
        store.insert("page-1", StructuredContent::default(), 3);

        let version = store
            .save_document("page-1", &StructuredContent::default(), 3)
            .await
            .unwrap();
        assert_eq!(version, 4);

        let stale = store
            .save_document("page-1", &StructuredContent::default(), 3)
            .await;
        assert_eq!(stale, Err(StoreError::VersionConflict { current: 4 }));
    }

    #[tokio::test]
    async fn test_load_missing_document() {
        let store = MemoryStore::new();
        let result = store.load_document("nope").await;
        assert_eq!(result.unwrap_err(), StoreError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_remote_write_notifies_subscribers() {
        let store = MemoryStore::new();
        store.insert("page-1", StructuredContent::default(), 1);
        let mut feed = store.remote_updates();

        let version = store.write_remote("page-1", StructuredContent::default());

        assert_eq!(version, 2);
        assert_eq!(
            feed.recv().await.unwrap(),
            RemoteUpdate {
                document_id: "page-1".to_string(),
                version: 2
            }
        );
    }
}
