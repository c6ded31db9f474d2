//! Pipeline orchestration: manifest to assembled book.
//!
//! One logical batch job. Chapter parsing is the only parallel stage (each
//! chapter depends solely on its own source file); parses fan out across
//! rayon workers and are collected back in manifest order, so the merge is
//! deterministic regardless of completion order. Everything after the
//! collection barrier — asset resolution's deferred binding, anchor
//! registration, assembly, highlighting — requires the complete chapter set
//! and runs sequentially over write-once state.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::anchors::Registry;
use crate::assets::{self, ImageCopy};
use crate::chapter;
use crate::error::{Error, Result};
use crate::export::BookMeta;
use crate::highlight::{self, Highlighter, SyntectHighlighter};
use crate::manifest::{self, ChapterSource, MANIFEST_FILE};
use crate::model::{AssetReference, BookDocument, ChapterDocument};
use crate::report::{BuildReport, IssueKind};
use crate::{assemble, slug};

/// Everything a build produces. The report is always populated, success or
/// not; export drivers consume `book` (plus the copy plan for images).
#[derive(Debug)]
pub struct BuildOutput {
    pub book: BookDocument,
    pub report: BuildReport,
    /// Images to copy into the output's `images/` directory.
    pub copies: Vec<ImageCopy>,
    /// Every tracked image/link reference, with final states.
    pub references: Vec<AssetReference>,
    pub meta: BookMeta,
}

/// Build a book project with the default syntect highlighter.
pub fn build(project_root: &Path) -> Result<BuildOutput> {
    build_with(project_root, &SyntectHighlighter::new())
}

/// Build a book project with a caller-supplied highlighter.
pub fn build_with(project_root: &Path, highlighter: &dyn Highlighter) -> Result<BuildOutput> {
    let mut report = BuildReport::new();

    let manifest_path = project_root.join(MANIFEST_FILE);
    let bytes = fs::read(&manifest_path)
        .map_err(|e| Error::Manifest(format!("{}: {e}", manifest_path.display())))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| Error::Manifest(format!("{} is not valid UTF-8", manifest_path.display())))?;

    let manifest = manifest::read(&text, project_root, &mut report);
    let planned = manifest.flatten();
    if planned.is_empty() {
        return Err(Error::NoChapters);
    }
    info!("manifest lists {} chapters", planned.len());

    // Fan-out: parse each chapter independently. Failures yield an empty
    // stand-in plus a deferred issue; no shared state crosses workers.
    let parsed: Vec<(ChapterDocument, Option<(PathBuf, String)>)> = planned
        .par_iter()
        .map(|plan| match &plan.source {
            ChapterSource::PartTitle => (chapter::synthetic(&plan.title), None),
            ChapterSource::File(path) => match fs::read(project_root.join(path)) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => (chapter::parse(&text, path.clone()), None),
                    Err(_) => (
                        ChapterDocument::empty(path.clone()),
                        Some((path.clone(), "not valid UTF-8".to_string())),
                    ),
                },
                Err(e) => (
                    ChapterDocument::empty(path.clone()),
                    Some((path.clone(), e.to_string())),
                ),
            },
        })
        .collect();

    // Fan-in barrier: all parses are done; merge results in manifest order.
    let mut chapters = Vec::with_capacity(parsed.len());
    for (doc, issue) in parsed {
        if let Some((path, detail)) = issue {
            warn!("skipping unreadable chapter {}: {detail}", path.display());
            report.record(IssueKind::UnreadableChapter, &path, detail);
        }
        chapters.push(doc);
    }
    if chapters.iter().all(|c| c.tree.is_empty()) {
        return Err(Error::NoChapters);
    }

    let mut references = Vec::new();
    let mut copies = Vec::new();
    for (index, chapter) in chapters.iter_mut().enumerate() {
        if chapter.source.as_os_str().is_empty() {
            continue;
        }
        let (refs, chapter_copies) = assets::resolve(index, chapter, project_root, &mut report);
        references.extend(refs);
        copies.extend(chapter_copies);
    }

    let registry = Registry::register(&mut chapters, &mut report);
    registry.bind(&mut chapters, &mut references, &mut report);
    info!("registered {} anchors", registry.len());

    let mut book = assemble::assemble(&planned, &chapters, &registry);
    highlight::apply(&mut book, highlighter, &mut report);

    let title = project_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Book".to_string());
    let mut meta = BookMeta::new(&title);
    meta.identifier = slug::slugify_or(&title, "book");

    Ok(BuildOutput {
        book,
        report,
        copies,
        references,
        meta,
    })
}
