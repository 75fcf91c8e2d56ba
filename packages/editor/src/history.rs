//! # Undo/Redo History
//!
//! Bounded linear history of document snapshots.
//!
//! ## Design
//!
//! - Every mutation checkpoints the pre-mutation content before it is applied
//! - Entries are deep copies; nothing in the history aliases the live document
//! - A checkpoint after an undo discards the redo branch
//! - Past `max_length` entries, the oldest is evicted
//!
//! The live document usually runs one step ahead of the newest checkpoint.
//! The first `undo` after an edit records the live content as the new tip, so
//! the following `redo` lands exactly on the post-edit state.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(50);
//! history.reset(doc.content());
//!
//! history.checkpoint(doc.content());
//! // ... mutate doc ...
//!
//! if let Some(previous) = history.undo(doc.content()) {
//!     // restore previous
//! }
//! ```

use chrono::{DateTime, Utc};
use pagecraft_blocks::StructuredContent;
use tracing::debug;

/// Default number of retained snapshots
pub const DEFAULT_MAX_LENGTH: usize = 50;

/// One snapshot in the history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub content: StructuredContent,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    fn capture(content: &StructuredContent) -> Self {
        Self {
            content: content.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Undo/redo history for one editing session
#[derive(Debug)]
pub struct History {
    items: Vec<HistoryItem>,

    /// Index of the snapshot matching the last undo/redo/checkpoint position
    cursor: usize,

    max_length: usize,

    /// Set by `checkpoint`: the live document has moved past `items[cursor]`
    live_ahead: bool,
}

impl History {
    /// Create a history bounded to `max_length` snapshots (at least 2)
    pub fn new(max_length: usize) -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            max_length: max_length.max(2),
            live_ahead: false,
        }
    }

    /// Drop everything and start over from a single snapshot
    pub fn reset(&mut self, content: &StructuredContent) {
        self.items.clear();
        self.items.push(HistoryItem::capture(content));
        self.cursor = 0;
        self.live_ahead = false;
    }

    /// Record the content as it is before a mutation.
    ///
    /// Anything after the cursor is discarded. The snapshot is skipped when it
    /// is identical to the one at the cursor (e.g. the first edit after a load
    /// or an undo).
    pub fn checkpoint(&mut self, content: &StructuredContent) {
        if !self.items.is_empty() {
            self.items.truncate(self.cursor + 1);
        }

        let unchanged = self
            .items
            .get(self.cursor)
            .map_or(false, |item| &item.content == content);

        if !unchanged {
            self.push(HistoryItem::capture(content));
        }
        self.live_ahead = true;

        debug!(len = self.items.len(), cursor = self.cursor, "History checkpoint");
    }

    /// Step back. `current` is the live content, recorded as the redo target
    /// when it is ahead of the history.
    pub fn undo(&mut self, current: &StructuredContent) -> Option<StructuredContent> {
        if std::mem::take(&mut self.live_ahead) {
            let differs = self
                .items
                .get(self.cursor)
                .map_or(false, |item| &item.content != current);

            if differs {
                // The cursor stays on the pre-edit snapshot; the live state
                // becomes the tip right after it.
                self.push_tip(HistoryItem::capture(current));
                return self.items.get(self.cursor).map(|item| item.content.clone());
            }
        }

        if self.items.is_empty() || self.cursor == 0 {
            return None;
        }

        self.cursor -= 1;
        Some(self.items[self.cursor].content.clone())
    }

    /// Step forward again after an undo
    pub fn redo(&mut self) -> Option<StructuredContent> {
        if self.live_ahead || self.cursor + 1 >= self.items.len() {
            return None;
        }

        self.cursor += 1;
        Some(self.items[self.cursor].content.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.items.is_empty() && (self.cursor > 0 || self.live_ahead)
    }

    pub fn can_redo(&self) -> bool {
        !self.live_ahead && self.cursor + 1 < self.items.len()
    }

    /// Number of retained snapshots
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Most recently pushed snapshot
    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.last()
    }

    /// Append and move the cursor onto the new entry
    fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
        self.cursor = self.items.len() - 1;
        self.evict();
    }

    /// Append without moving the cursor
    fn push_tip(&mut self, item: HistoryItem) {
        self.items.push(item);
        self.evict();
    }

    fn evict(&mut self) {
        while self.items.len() > self.max_length {
            self.items.remove(0);
            self.cursor = self.cursor.saturating_sub(1);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}
