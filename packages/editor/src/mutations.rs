//! # Block Mutations
//!
//! High-level editing operations on a page.
//!
//! ## Design Principles
//!
//! 1. **Plan, then commit**: a mutation first computes the complete new block
//!    list from the current document; the session commits it in one step
//! 2. **Absorb stale targets**: an id or index that no longer exists turns the
//!    mutation into a no-op instead of an error
//! 3. **Validate payloads**: partial updates are re-checked against the block
//!    variant; malformed data never reaches the document
//!
//! ## Mutation Semantics
//!
//! ### AddBlock
//! - Inserted after `after_id` when it resolves, at the end otherwise
//! - The new block becomes selected
//!
//! ### MoveBlock
//! - Single-element move (remove, then reinsert at `to`)
//! - No-op when `from == to` or either index is out of range
//!
//! ### DuplicateBlock
//! - Deep copy under a new id, inserted right after the original
//! - The copy becomes selected
//!
//! ### UpdateBlock / ReplaceBlockData
//! - The block's tag can never change through these
//! - An empty patch is a no-op and does not touch `last_edited_at`
//!
//! ### UpdatePageMeta / UpdateGlobalSettings
//! - No-op when the new value equals the current one

use pagecraft_blocks::{
    create_default, BlockData, BlockPatch, BlockType, ContentBlock, GlobalSettings, PageMeta,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;
use crate::errors::MutationError;

/// Semantic edits on a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a default block of `block_type`
    AddBlock {
        block_type: BlockType,
        after_id: Option<Uuid>,
    },

    /// Remove a block
    DeleteBlock { id: Uuid },

    /// Move the block at `from` to position `to`
    MoveBlock { from: usize, to: usize },

    /// Copy a block and place the copy after it
    DuplicateBlock { id: Uuid },

    /// Shallow-merge fields into a block
    UpdateBlock { id: Uuid, patch: BlockPatch },

    /// Replace a block's whole payload (raw JSON editing)
    ReplaceBlockData { id: Uuid, data: BlockData },

    /// Replace page metadata
    UpdatePageMeta { meta: PageMeta },

    /// Replace global page settings
    UpdateGlobalSettings { settings: GlobalSettings },
}

/// Effect of a planned mutation on the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Keep,
    Select(Uuid),
    /// Clear the selection if it points at this block
    ClearIf(Uuid),
}

/// Fully computed result of a mutation, ready to commit
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Blocks {
        blocks: Vec<ContentBlock>,
        selection: SelectionChange,
    },
    PageMeta(PageMeta),
    GlobalSettings(GlobalSettings),
}

impl Mutation {
    /// Compute the change this mutation would make to `doc`.
    ///
    /// `Ok(None)` means the mutation addresses something that does not exist
    /// and should be dropped silently.
    pub fn plan(&self, doc: &Document) -> Result<Option<Change>, MutationError> {
        match self {
            Mutation::AddBlock { block_type, after_id } => {
                Ok(Some(Self::plan_add(doc, *block_type, *after_id)))
            }

            Mutation::DeleteBlock { id } => Ok(Self::plan_delete(doc, *id)),

            Mutation::MoveBlock { from, to } => Ok(Self::plan_move(doc, *from, *to)),

            Mutation::DuplicateBlock { id } => Ok(Self::plan_duplicate(doc, *id)),

            Mutation::UpdateBlock { id, patch } => {
                if patch.is_empty() {
                    return Ok(None);
                }
                Self::plan_replace_with(doc, *id, |block| block.merge_patch(patch))
            }

            Mutation::ReplaceBlockData { id, data } => {
                Self::plan_replace_with(doc, *id, |block| block.with_data(data.clone()))
            }

            Mutation::UpdatePageMeta { meta } => {
                let changed = doc.content().meta != *meta;
                Ok(changed.then(|| Change::PageMeta(meta.clone())))
            }

            Mutation::UpdateGlobalSettings { settings } => {
                let changed = doc.content().global_settings != *settings;
                Ok(changed.then(|| Change::GlobalSettings(settings.clone())))
            }
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddBlock { .. } => "add_block",
            Mutation::DeleteBlock { .. } => "delete_block",
            Mutation::MoveBlock { .. } => "move_block",
            Mutation::DuplicateBlock { .. } => "duplicate_block",
            Mutation::UpdateBlock { .. } => "update_block",
            Mutation::ReplaceBlockData { .. } => "replace_block_data",
            Mutation::UpdatePageMeta { .. } => "update_page_meta",
            Mutation::UpdateGlobalSettings { .. } => "update_global_settings",
        }
    }

    fn plan_add(doc: &Document, block_type: BlockType, after_id: Option<Uuid>) -> Change {
        insert_after(doc, create_default(block_type, 0), after_id)
    }

    fn plan_delete(doc: &Document, id: Uuid) -> Option<Change> {
        let index = doc.index_of(id)?;

        let mut blocks = doc.blocks().to_vec();
        blocks.remove(index);

        Some(Change::Blocks {
            blocks,
            selection: SelectionChange::ClearIf(id),
        })
    }

    fn plan_move(doc: &Document, from: usize, to: usize) -> Option<Change> {
        let len = doc.len();
        if from == to || from >= len || to >= len {
            return None;
        }

        let mut blocks = doc.blocks().to_vec();
        let moved = blocks.remove(from);
        blocks.insert(to, moved);

        Some(Change::Blocks {
            blocks,
            selection: SelectionChange::Keep,
        })
    }

    fn plan_duplicate(doc: &Document, id: Uuid) -> Option<Change> {
        let index = doc.index_of(id)?;
        let copy = doc.blocks()[index].duplicate();
        let selection = SelectionChange::Select(copy.id());

        let mut blocks = doc.blocks().to_vec();
        blocks.insert(index + 1, copy);

        Some(Change::Blocks { blocks, selection })
    }

    fn plan_replace_with<F, E>(
        doc: &Document,
        id: Uuid,
        replace: F,
    ) -> Result<Option<Change>, MutationError>
    where
        F: FnOnce(&ContentBlock) -> Result<ContentBlock, E>,
        MutationError: From<E>,
    {
        let Some(index) = doc.index_of(id) else {
            return Ok(None);
        };

        let replacement = replace(&doc.blocks()[index])?;

        let mut blocks = doc.blocks().to_vec();
        blocks[index] = replacement;

        Ok(Some(Change::Blocks {
            blocks,
            selection: SelectionChange::Keep,
        }))
    }
}

/// Insert `block` after `after_id`, or at the end when that id does not
/// resolve. The inserted block becomes selected.
pub(crate) fn insert_after(doc: &Document, block: ContentBlock, after_id: Option<Uuid>) -> Change {
    let index = after_id
        .and_then(|id| doc.index_of(id))
        .map(|i| i + 1)
        .unwrap_or_else(|| doc.len());

    let selection = SelectionChange::Select(block.id());

    let mut blocks = doc.blocks().to_vec();
    blocks.insert(index, block);

    Change::Blocks { blocks, selection }
}
