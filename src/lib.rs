//! # bookpress
//!
//! Assemble a multi-file Markdown book project — a directory of chapters
//! plus a `SUMMARY.md` navigation manifest, GitBook style — into a single
//! paginated document ready for PDF and EPUB backends.
//!
//! ## Features
//!
//! - Manifest-driven chapter ordering with nested parts
//! - Parallel chapter parsing, deterministic manifest-order merge
//! - Book-wide anchor registry: unique heading ids, cross-chapter links,
//!   stable collision numbering
//! - Graceful degradation: missing files, broken images, and unresolvable
//!   links become placeholders plus report entries, never hard failures
//! - Syntax-highlighted code blocks (syntect), tables, footnotes, and
//!   task-list checkboxes
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bookpress::export::{render_body, StyleTemplate};
//! use bookpress::pipeline;
//!
//! let output = pipeline::build(Path::new("my-book/")).unwrap();
//! let html = StyleTemplate::default().merge(&render_body(&output.book));
//!
//! for entry in &output.book.toc {
//!     println!("{} {} (#{})", "#".repeat(entry.depth as usize), entry.title, entry.anchor);
//! }
//! for issue in &output.report.issues {
//!     eprintln!("warning: {issue}");
//! }
//! ```
//!
//! The assembled [`BookDocument`] is the sole artifact handed to rendering
//! backends; PDF and EPUB generation plug in through the
//! [`export::PdfRenderer`] and [`export::EpubPackager`] traits.

pub mod anchors;
pub mod assemble;
pub mod assets;
pub mod chapter;
pub mod error;
pub mod export;
pub mod highlight;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod slug;

pub use error::{Error, Result};
pub use model::{BookDocument, ChapterDocument, TocEntry};
pub use pipeline::{build, BuildOutput};
pub use report::{BuildReport, Issue, IssueKind};
