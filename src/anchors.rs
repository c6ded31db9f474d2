//! Anchor registry: globally unique ids for headings and targets.
//!
//! Cross-chapter linking is a two-pass problem: a label can forward-reference
//! a heading in a chapter that comes later in the manifest. The registry
//! therefore works in two strictly ordered phases:
//!
//! 1. [`Registry::register`] walks every chapter in manifest order and
//!    assigns each heading, footnote definition, and chapter start a
//!    candidate id derived from a slug of its text. On collision the id gets
//!    a `-2`, `-3`... suffix in first-seen order; the bare slug always
//!    belongs to the first-registered anchor. Given an unchanged manifest,
//!    ids are byte-identical across runs.
//! 2. [`Registry::bind`] resolves the deferred reference tokens emitted by
//!    asset resolution. Unmatched references are marked Broken and surface
//!    as placeholders plus a report entry, never dropped and never fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::assets::normalize;
use crate::model::{
    AssetReference, AssetState, ChapterDocument, LinkLabel, LinkState, NodeKind,
};
use crate::report::{BuildReport, IssueKind};
use crate::slug::{slugify, slugify_or};

/// What an anchor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// A heading, id derived from its text.
    Heading,
    /// A heading with an explicitly declared id (`{#custom-id}`).
    CustomTarget,
    /// A footnote definition.
    Footnote,
    /// The start of a chapter, id derived from its source path stem.
    ChapterStart,
}

/// One registered anchor.
#[derive(Debug, Clone)]
pub struct Anchor {
    /// Final id, unique within the whole book.
    pub id: String,
    pub kind: AnchorKind,
    /// Source path of the owning chapter (empty for synthetic chapters).
    pub origin: PathBuf,
    /// The text or label the id was derived from.
    pub label: String,
}

/// Book-wide anchor registry. Write-once: populated by [`register`],
/// read-only from the moment binding and assembly begin.
///
/// [`register`]: Registry::register
#[derive(Debug, Default)]
pub struct Registry {
    anchors: Vec<Anchor>,
    by_id: HashMap<String, usize>,
    /// Next suffix to try per slug base.
    suffixes: HashMap<String, usize>,
    /// Chapter-start anchor id per chapter index (None for synthetic).
    starts: Vec<Option<String>>,
    /// Footnote definition ids, keyed per chapter since footnote labels
    /// are only unique within one source file.
    footnotes: HashMap<(usize, String), String>,
}

impl Registry {
    /// Walk all chapters in manifest order and assign final anchor ids,
    /// writing them back into heading and footnote-definition nodes.
    pub fn register(chapters: &mut [ChapterDocument], report: &mut BuildReport) -> Registry {
        let mut registry = Registry::default();

        for (index, chapter) in chapters.iter_mut().enumerate() {
            let origin = chapter.source.clone();

            // Chapter-start anchor from the source path stem, so whole-file
            // links (`other.md`) have a target in the merged document.
            if origin.as_os_str().is_empty() {
                registry.starts.push(None);
            } else {
                let stem = origin.with_extension("");
                let base = path_slug(&stem);
                let id = registry.claim(
                    &base,
                    AnchorKind::ChapterStart,
                    &origin,
                    &stem.to_string_lossy(),
                    report,
                );
                registry.starts.push(Some(id));
            }

            let ids: Vec<_> = chapter.tree.walk().collect();
            for node_id in ids {
                match chapter.tree.node(node_id).kind.clone() {
                    NodeKind::Heading { level, id } => {
                        let text = chapter.tree.collect_text(node_id);
                        let (base, kind) = match &id {
                            Some(explicit) => {
                                (slugify_or(explicit, "section"), AnchorKind::CustomTarget)
                            }
                            None => (slugify_or(&text, "section"), AnchorKind::Heading),
                        };
                        let final_id = registry.claim(&base, kind, &origin, &text, report);
                        chapter.tree.node_mut(node_id).kind = NodeKind::Heading {
                            level,
                            id: Some(final_id),
                        };
                    }
                    NodeKind::FootnoteDefinition { label, .. } => {
                        let base = format!("footnote-{}", slugify_or(&label, "note"));
                        let final_id = registry.claim(
                            &base,
                            AnchorKind::Footnote,
                            &origin,
                            &label,
                            report,
                        );
                        registry
                            .footnotes
                            .insert((index, label.clone()), final_id.clone());
                        chapter.tree.node_mut(node_id).kind = NodeKind::FootnoteDefinition {
                            label,
                            id: Some(final_id),
                        };
                    }
                    _ => {}
                }
            }
        }

        registry
    }

    /// Claim a unique id for `base`, suffixing on collision.
    fn claim(
        &mut self,
        base: &str,
        kind: AnchorKind,
        origin: &Path,
        label: &str,
        report: &mut BuildReport,
    ) -> String {
        let mut id = base.to_string();
        if self.by_id.contains_key(&id) {
            let mut next = self.suffixes.get(base).copied().unwrap_or(2);
            loop {
                id = format!("{base}-{next}");
                next += 1;
                if !self.by_id.contains_key(&id) {
                    break;
                }
            }
            self.suffixes.insert(base.to_string(), next);
            report.record(
                IssueKind::DuplicateAnchor,
                origin,
                format!("{base} -> {id}"),
            );
        }

        debug!("anchor {id} ({kind:?}) from {label:?}");
        self.by_id.insert(id.clone(), self.anchors.len());
        self.anchors.push(Anchor {
            id: id.clone(),
            kind,
            origin: origin.to_path_buf(),
            label: label.to_string(),
        });
        id
    }

    /// Bind every deferred reference, rewriting link nodes in place and
    /// finalizing the asset table. Also binds footnote references to their
    /// same-chapter definitions.
    pub fn bind(
        &self,
        chapters: &mut [ChapterDocument],
        references: &mut [AssetReference],
        report: &mut BuildReport,
    ) {
        for reference in references.iter_mut() {
            if reference.state != AssetState::Deferred {
                continue;
            }
            let chapter = &mut chapters[reference.chapter];
            let NodeKind::Link(LinkState::Deferred(label)) =
                chapter.tree.node(reference.node).kind.clone()
            else {
                continue;
            };

            match self.lookup(&label, &reference.origin) {
                Some(id) => {
                    reference.state = AssetState::Ok(format!("#{id}"));
                    chapter.tree.node_mut(reference.node).kind =
                        NodeKind::Link(LinkState::Anchor(id));
                }
                None => {
                    reference.state = AssetState::Broken;
                    report.record(IssueKind::BrokenLink, &reference.origin, &reference.raw);
                    chapter.tree.node_mut(reference.node).kind =
                        NodeKind::Link(LinkState::Broken(reference.raw.clone()));
                }
            }
        }

        for (index, chapter) in chapters.iter_mut().enumerate() {
            let ids: Vec<_> = chapter.tree.walk().collect();
            for node_id in ids {
                let NodeKind::FootnoteReference { label, target: None } =
                    chapter.tree.node(node_id).kind.clone()
                else {
                    continue;
                };
                let target = self.footnotes.get(&(index, label.clone())).cloned();
                if target.is_none() {
                    report.record(
                        IssueKind::BrokenLink,
                        &chapter.source,
                        format!("footnote [^{label}] has no definition"),
                    );
                }
                chapter.tree.node_mut(node_id).kind =
                    NodeKind::FootnoteReference { label, target };
            }
        }
    }

    /// Resolve a deferred label against the registry.
    fn lookup(&self, label: &LinkLabel, origin: &Path) -> Option<String> {
        match label {
            LinkLabel::Fragment(fragment) => {
                let slug = slugify(fragment);
                (!slug.is_empty() && self.by_id.contains_key(&slug)).then_some(slug)
            }
            LinkLabel::ChapterStart(stem) => {
                // Try the stem as written (manifest-relative convention),
                // then resolved against the linking chapter's directory.
                let written = path_slug(Path::new(stem));
                if self.by_id.contains_key(&written) {
                    return Some(written);
                }
                let dir = origin.parent().unwrap_or(Path::new(""));
                let resolved = path_slug(&normalize(&dir.join(stem)));
                self.by_id.contains_key(&resolved).then_some(resolved)
            }
        }
    }

    /// All anchors in registration (manifest) order.
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn get(&self, id: &str) -> Option<&Anchor> {
        self.by_id.get(id).map(|&i| &self.anchors[i])
    }

    /// Chapter-start anchor id for the chapter at `index` in manifest order.
    pub fn chapter_start(&self, index: usize) -> Option<&str> {
        self.starts.get(index).and_then(|s| s.as_deref())
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Slug for a chapter path stem: each component slugified, joined with `-`,
/// so `guide/ch2` becomes `guide-ch2` rather than losing the separator.
fn path_slug(stem: &Path) -> String {
    let joined = stem
        .components()
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if joined.is_empty() {
        "chapter".to_string()
    } else {
        joined
    }
}
