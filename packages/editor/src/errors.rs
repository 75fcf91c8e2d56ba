//! Error types for the editor

use pagecraft_blocks::BlockPayloadError;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Violations of the document's structural invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(Uuid),
}

/// Mutations that were refused.
///
/// Addressing a block or index that does not exist is NOT an error; those
/// mutations are absorbed as no-ops.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    Payload(#[from] BlockPayloadError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No document loaded")]
    NoDocumentLoaded,
}
