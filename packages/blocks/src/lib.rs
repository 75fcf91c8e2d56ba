//! # Pagecraft Blocks
//!
//! Data model for structured pages: typed content blocks, page metadata and
//! the registry of default block payloads.
//!
//! This crate is pure data. All editing rules (ordering, history,
//! persistence) live in `pagecraft-editor`.

mod block;
mod content;
mod error;
pub mod registry;

pub use block::*;
pub use content::{GlobalSettings, PageMeta, StructuredContent};
pub use error::BlockPayloadError;
pub use registry::{create_default, create_default_from_tag, default_data};
