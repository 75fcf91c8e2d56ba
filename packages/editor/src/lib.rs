//! # Pagecraft Editor
//!
//! In-memory editing engine for block-structured pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ blocks: block types, defaults, page content │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorSession                       │
//! │  - Document (ordered blocks)                │
//! │  - Mutations (add/delete/move/update/...)   │
//! │  - History (bounded undo/redo)              │
//! │  - Persistence (versions, dirty, conflicts) │
//! │  - Preview (debounced rendering)            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ DocumentStore / PreviewRenderer (external)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The remote store is the durable copy**: nothing is persisted locally
//! 2. **Stale targets are no-ops**: mutations never fail on a missing id
//! 3. **Never discard local work**: failed saves and remote conflicts keep edits
//! 4. **Block type lives in the payload**: a block's tag cannot disagree with
//!    its data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditorConfig, EditorSession, MemoryStore};
//! use pagecraft_blocks::BlockType;
//!
//! let store = Arc::new(MemoryStore::new());
//! let session = EditorSession::new(store, EditorConfig::load(".")?);
//!
//! session.load_content("best-headphones").await?;
//!
//! let intro = session.add_block(BlockType::Intro, None);
//! session.add_block(BlockType::ProductCard, Some(intro));
//! session.undo();
//!
//! session.save_content().await?;
//! ```

mod config;
mod document;
mod errors;
mod history;
mod mutations;
mod persistence;
mod preview;
mod session;
mod store;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::Document;
pub use errors::{DocumentError, EditorError, MutationError};
pub use history::{History, HistoryItem, DEFAULT_MAX_LENGTH};
pub use mutations::{Change, Mutation, SelectionChange};
pub use persistence::{
    LoadTicket, PersistenceState, RemoteConflict, RemoteDecision, SaveCompletion, SaveRequest,
    SaveResult, SaveTicket,
};
pub use preview::{PreviewOutput, PreviewSync, DEFAULT_DEBOUNCE};
pub use session::{
    EditorEvent, EditorSession, LoadOutcome, RemoteUpdateOutcome, SaveOutcome, SessionStatus,
};
pub use store::{DocumentStore, MemoryStore, PreviewRenderer, RemoteUpdate, StoreError};

// Re-export common types for convenience
pub use pagecraft_blocks::{BlockPatch, BlockType, ContentBlock, StructuredContent};
