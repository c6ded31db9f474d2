//! Error types for book assembly.

use thiserror::Error;

/// Fatal errors that abort a build.
///
/// Everything recoverable (missing chapter files, broken links, unknown
/// languages) goes into the [`BuildReport`](crate::report::BuildReport)
/// instead; only conditions that make assembly impossible surface here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("No usable chapters: every manifest entry was missing or unreadable")]
    NoChapters,
}

pub type Result<T> = std::result::Result<T, Error>;
