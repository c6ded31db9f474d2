//! Manifest reading: the navigation outline that defines chapter order.
//!
//! A book project carries a `SUMMARY.md` at its root listing chapters as a
//! nested Markdown list; indentation denotes nesting depth:
//!
//! ```text
//! # Summary
//!
//! ## Getting Started
//!
//! - [Intro](intro.md)
//!   - [Install](setup/install.md)
//! - [Advanced](advanced.md)
//! ```
//!
//! `## Part` headings become synthetic chapters containing just the part
//! title as a heading. Sibling order is manifest appearance order and is
//! preserved end-to-end through assembly.

use std::path::{Path, PathBuf};

use log::warn;

use crate::report::{BuildReport, IssueKind};

/// Conventional manifest file name at the project root.
pub const MANIFEST_FILE: &str = "SUMMARY.md";

/// Where a manifest entry's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSource {
    /// A Markdown chapter file, relative to the project root.
    File(PathBuf),
    /// A part heading in the manifest; rendered as a synthetic chapter
    /// containing only the title as a heading.
    PartTitle,
}

/// One entry in the manifest tree.
///
/// Invariant: children have strictly greater `depth` than their parent
/// (guaranteed by construction from indentation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: String,
    pub source: ChapterSource,
    pub depth: usize,
    pub children: Vec<ManifestEntry>,
}

/// The parsed manifest: an ordered tree of entries.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

/// A manifest entry flattened to its depth-first position; the unit of the
/// parse fan-out. Duplicate source paths yield independent instances.
#[derive(Debug, Clone)]
pub struct PlannedChapter {
    pub title: String,
    pub source: ChapterSource,
    pub depth: usize,
}

impl Manifest {
    /// Flatten the tree depth-first in sibling order.
    pub fn flatten(&self) -> Vec<PlannedChapter> {
        let mut out = Vec::new();
        for entry in &self.entries {
            flatten_into(entry, &mut out);
        }
        out
    }
}

fn flatten_into(entry: &ManifestEntry, out: &mut Vec<PlannedChapter>) {
    out.push(PlannedChapter {
        title: entry.title.clone(),
        source: entry.source.clone(),
        depth: entry.depth,
    });
    for child in &entry.children {
        flatten_into(child, out);
    }
}

/// Parse the manifest text into an entry tree.
///
/// Entries referencing a nonexistent file under `project_root` are dropped
/// along with their whole branch (siblings continue) and reported as
/// [`IssueKind::MissingSource`]. Structurally unparseable lines are skipped
/// with a warning, never fatal.
pub fn read(text: &str, project_root: &Path, report: &mut BuildReport) -> Manifest {
    // Raw entries in appearance order, before nesting.
    struct RawEntry {
        indent: usize,
        title: String,
        source: ChapterSource,
    }

    let mut raw = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if let Some(title) = line.strip_prefix("## ") {
            let title = title.trim();
            if !title.is_empty() {
                raw.push(RawEntry {
                    indent: 0,
                    title: title.to_string(),
                    source: ChapterSource::PartTitle,
                });
            }
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim_start();
        let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("+ "))
        else {
            continue;
        };

        match parse_link(rest) {
            Some((title, path)) if !title.is_empty() && !path.is_empty() => {
                raw.push(RawEntry {
                    indent,
                    title,
                    source: ChapterSource::File(PathBuf::from(path)),
                });
            }
            _ => {
                warn!("skipping unparseable manifest line {}: {trimmed:?}", lineno + 1);
                report.record_global(
                    IssueKind::SkippedEntry,
                    format!("line {}: {trimmed}", lineno + 1),
                );
            }
        }
    }

    // Nest by indentation. The stack holds (indent, path-of-indices) into
    // the tree under construction.
    let mut entries: Vec<ManifestEntry> = Vec::new();
    let mut stack: Vec<(usize, Vec<usize>)> = Vec::new();

    for entry in raw {
        if matches!(entry.source, ChapterSource::PartTitle) {
            stack.clear();
        }
        while let Some((top_indent, _)) = stack.last() {
            if entry.indent <= *top_indent {
                stack.pop();
            } else {
                break;
            }
        }

        let depth = stack.len();
        let node = ManifestEntry {
            title: entry.title,
            source: entry.source,
            depth,
            children: Vec::new(),
        };

        let mut path = match stack.last() {
            Some((_, parent_path)) => {
                let siblings = siblings_mut(&mut entries, parent_path);
                siblings.push(node);
                let mut path = parent_path.clone();
                path.push(siblings.len() - 1);
                path
            }
            None => {
                entries.push(node);
                vec![entries.len() - 1]
            }
        };

        stack.push((entry.indent, std::mem::take(&mut path)));
    }

    let mut manifest = Manifest { entries };
    prune_missing(&mut manifest.entries, project_root, report);
    manifest
}

/// Mutable access to the child list addressed by an index path.
fn siblings_mut<'a>(
    entries: &'a mut Vec<ManifestEntry>,
    path: &[usize],
) -> &'a mut Vec<ManifestEntry> {
    let mut current = entries;
    for &idx in path {
        current = &mut current[idx].children;
    }
    current
}

/// Drop entries whose source file does not exist, with their whole branch.
fn prune_missing(entries: &mut Vec<ManifestEntry>, project_root: &Path, report: &mut BuildReport) {
    entries.retain(|entry| match &entry.source {
        ChapterSource::PartTitle => true,
        ChapterSource::File(path) => {
            let exists = project_root.join(path).is_file();
            if !exists {
                let dropped = count_entries(entry) - 1;
                let detail = if dropped > 0 {
                    format!("{} (branch of {} nested entries dropped)", path.display(), dropped)
                } else {
                    path.display().to_string()
                };
                report.record(IssueKind::MissingSource, path, detail);
            }
            exists
        }
    });
    for entry in entries {
        prune_missing(&mut entry.children, project_root, report);
    }
}

fn count_entries(entry: &ManifestEntry) -> usize {
    1 + entry.children.iter().map(count_entries).sum::<usize>()
}

/// Parse `[title](path)` from the start of a list item.
fn parse_link(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('[')?;
    let close = rest.find(']')?;
    let title = rest[..close].trim().to_string();
    let after = rest[close + 1..].trim_start();
    let target = after.strip_prefix('(')?;
    let end = target.find(')')?;
    let path = target[..end].trim().to_string();
    Some((title, path))
}
