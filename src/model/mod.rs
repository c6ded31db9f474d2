//! Core data model for book assembly.
//!
//! This module contains:
//! - The arena-held document tree ([`Tree`], [`Node`], [`NodeId`])
//! - Per-chapter and book-level documents
//! - Href classification and tracked asset references
//! - The flat table-of-contents view

mod document;
mod links;
mod node;

pub use document::{BookDocument, ChapterDocument, DfsIter, TocEntry, Tree};
pub use links::{AssetKind, AssetReference, AssetState, Href};
pub use node::{
    CellAlign, ImageState, LinkLabel, LinkState, Node, NodeId, NodeKind, TaskState,
};
