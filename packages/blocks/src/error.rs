use thiserror::Error;

use crate::block::BlockType;

/// A block payload that cannot be accepted into a document
#[derive(Error, Debug)]
pub enum BlockPayloadError {
    #[error("Malformed block payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Block type mismatch: block is {expected}, payload says {found}")]
    TypeMismatch { expected: BlockType, found: String },

    #[error("Field cannot be patched: {0}")]
    ReservedField(String),

    #[error("Block payload is not an object")]
    NotAnObject,

    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),
}
