//! # Document Model
//!
//! In-memory representation of one page being edited.
//!
//! A `Document` owns a [`StructuredContent`] and guarantees that its blocks
//! are always in a consistent order:
//!
//! - `blocks[i].meta.order == i` for every block
//! - no two blocks share an id
//!
//! [`Document::replace_blocks`] is the single place where that invariant is
//! enforced, so every structural edit (insert, delete, move, duplicate) is
//! expressed as "compute the new list, then replace". Mutators are
//! crate-private: outside the crate the document is read-only and only the
//! session's mutation path can change it.

use pagecraft_blocks::{ContentBlock, GlobalSettings, PageMeta, StructuredContent};
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::DocumentError;

/// Editable page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    content: StructuredContent,
}

impl Document {
    /// Empty document, as a session starts before anything is loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adopt content from outside (load, undo snapshot).
    ///
    /// Blocks are sorted by their stored `order` (stable for ties) and then
    /// renumbered `0..n`.
    pub fn from_content(mut content: StructuredContent) -> Result<Self, DocumentError> {
        ensure_unique_ids(&content.blocks)?;
        content.blocks.sort_by_key(|b| b.meta.order);
        renumber(&mut content.blocks);
        Ok(Self { content })
    }

    pub fn content(&self) -> &StructuredContent {
        &self.content
    }

    /// Order-sorted view of the blocks
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.content.blocks
    }

    pub fn block(&self, id: Uuid) -> Option<&ContentBlock> {
        self.content.block(id)
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.content.index_of(id)
    }

    pub fn len(&self) -> usize {
        self.content.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.blocks.is_empty()
    }

    /// Check a candidate block list without applying it
    pub(crate) fn validate_blocks(blocks: &[ContentBlock]) -> Result<(), DocumentError> {
        ensure_unique_ids(blocks)
    }

    /// Replace the block list. `order` is recomputed from list position.
    /// A list with duplicate ids is rejected and the document is untouched.
    pub(crate) fn replace_blocks(&mut self, mut blocks: Vec<ContentBlock>) -> Result<(), DocumentError> {
        ensure_unique_ids(&blocks)?;
        renumber(&mut blocks);
        self.content.blocks = blocks;
        Ok(())
    }

    /// Swap in a history snapshot. Snapshots were taken from this document,
    /// so they already satisfy the ordering invariant.
    pub(crate) fn restore(&mut self, content: StructuredContent) {
        self.content = content;
    }

    pub(crate) fn set_page_meta(&mut self, meta: PageMeta) {
        self.content.meta = meta;
    }

    pub(crate) fn set_global_settings(&mut self, settings: GlobalSettings) {
        self.content.global_settings = settings;
    }
}

fn ensure_unique_ids(blocks: &[ContentBlock]) -> Result<(), DocumentError> {
    let mut seen = HashSet::with_capacity(blocks.len());
    for block in blocks {
        if !seen.insert(block.id()) {
            return Err(DocumentError::DuplicateBlockId(block.id()));
        }
    }
    Ok(())
}

fn renumber(blocks: &mut [ContentBlock]) {
    for (index, block) in blocks.iter_mut().enumerate() {
        block.meta.order = index as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_blocks::{create_default, BlockType};

    fn assert_contiguous(doc: &Document) {
        for (index, block) in doc.blocks().iter().enumerate() {
            assert_eq!(block.order(), index as u32);
        }
    }

    #[test]
    fn test_create_empty_document() {
        let doc = Document::empty();
        assert!(doc.is_empty());
        assert_eq!(doc.content(), &StructuredContent::default());
    }

    #[test]
    fn test_from_content_sorts_and_renumbers() {
        let mut content = StructuredContent::default();
        content.blocks = vec![
            create_default(BlockType::Faq, 7),
            create_default(BlockType::Intro, 2),
            create_default(BlockType::Hero, 4),
        ];

        let doc = Document::from_content(content).unwrap();

        let types: Vec<_> = doc.blocks().iter().map(|b| b.block_type()).collect();
        assert_eq!(types, vec![BlockType::Intro, BlockType::Hero, BlockType::Faq]);
        assert_contiguous(&doc);
    }

    #[test]
    fn test_replace_blocks_recomputes_order() {
        let mut doc = Document::empty();
        let blocks = vec![
            create_default(BlockType::Intro, 42),
            create_default(BlockType::Step, 42),
            create_default(BlockType::Conclusion, 0),
        ];

        doc.replace_blocks(blocks).unwrap();

        assert_eq!(doc.len(), 3);
        assert_contiguous(&doc);
        assert_eq!(doc.blocks()[2].block_type(), BlockType::Conclusion);
    }

    #[test]
    fn test_replace_blocks_rejects_duplicate_ids() {
        let mut doc = Document::empty();
        let intro = create_default(BlockType::Intro, 0);
        doc.replace_blocks(vec![intro.clone()]).unwrap();

        let result = doc.replace_blocks(vec![intro.clone(), intro.clone()]);

        assert_eq!(result, Err(DocumentError::DuplicateBlockId(intro.id())));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_from_content_rejects_duplicate_ids() {
        let block = create_default(BlockType::Faq, 0);
        let mut content = StructuredContent::default();
        content.blocks = vec![block.clone(), block];

        assert!(Document::from_content(content).is_err());
    }
}
