//! Per-run report of recoverable issues.
//!
//! The pipeline degrades gracefully: a missing chapter file, a broken image,
//! or an unresolvable cross-reference never aborts the run. Each such event
//! is recorded here with its originating chapter, and the full report is
//! returned to the caller alongside the assembled book, success or not.

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a recoverable issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum IssueKind {
    /// A manifest entry points at a nonexistent chapter file; the branch
    /// was skipped.
    MissingSource,
    /// A chapter file could not be decoded as UTF-8; treated as empty.
    UnreadableChapter,
    /// A manifest line had no usable title/path and was skipped.
    SkippedEntry,
    /// An image path did not resolve to a file under the project root.
    BrokenImage,
    /// An internal link matched no registered anchor.
    BrokenLink,
    /// A fenced code block declared a language the highlighter does not
    /// recognize; rendered as escaped plain text.
    UnknownLanguage,
    /// Two anchors derived the same slug; resolved with a numeric suffix.
    /// Informational only.
    DuplicateAnchor,
}

impl IssueKind {
    /// Whether the issue is merely informational (no degraded output).
    pub fn is_info(self) -> bool {
        matches!(self, IssueKind::DuplicateAnchor)
    }
}

/// One recoverable issue.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Issue {
    pub kind: IssueKind,
    /// Originating chapter, when known.
    pub origin: Option<PathBuf>,
    pub detail: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{:?}: {} ({})", self.kind, self.detail, origin.display()),
            None => write!(f, "{:?}: {}", self.kind, self.detail),
        }
    }
}

/// Accumulated issues for one build.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct BuildReport {
    pub issues: Vec<Issue>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue with a known originating chapter.
    pub fn record(&mut self, kind: IssueKind, origin: &Path, detail: impl Into<String>) {
        self.issues.push(Issue {
            kind,
            origin: Some(origin.to_path_buf()),
            detail: detail.into(),
        });
    }

    /// Record an issue with no specific chapter (e.g. manifest-level).
    pub fn record_global(&mut self, kind: IssueKind, detail: impl Into<String>) {
        self.issues.push(Issue {
            kind,
            origin: None,
            detail: detail.into(),
        });
    }

    /// Whether no degrading issue occurred (informational ones ignored).
    pub fn is_clean(&self) -> bool {
        self.issues.iter().all(|i| i.kind.is_info())
    }

    /// Issues of a given kind.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_ignores_informational_issues() {
        let mut report = BuildReport::new();
        assert!(report.is_clean());

        report.record_global(IssueKind::DuplicateAnchor, "overview -> overview-2");
        assert!(report.is_clean());

        report.record(
            IssueKind::BrokenImage,
            Path::new("ch1.md"),
            "./img/missing.png",
        );
        assert!(!report.is_clean());
        assert_eq!(report.of_kind(IssueKind::BrokenImage).count(), 1);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn serializes_kinds_in_kebab_case() {
        let mut report = BuildReport::new();
        report.record(
            IssueKind::BrokenImage,
            Path::new("ch1.md"),
            "./img/missing.png",
        );
        report.record_global(IssueKind::UnknownLanguage, "zorblang");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"broken-image\""));
        assert!(json.contains("\"unknown-language\""));
        assert!(json.contains("ch1.md"));
    }
}
