//! Asset resolution: images and cross-chapter links.
//!
//! Runs once per parsed chapter. Image paths are resolved against the
//! chapter's own directory and checked for existence under the project
//! root; resolvable images are scheduled for copying into the build
//! output's `images/` directory under a portable name, missing ones become
//! Broken placeholders. Internal links cannot be resolved here (the target
//! anchor may live in a chapter not yet processed, or later in the
//! manifest), so they are rewritten to deferred reference tokens bound by
//! the anchor registry once every chapter has been seen. External URLs pass
//! through untouched.

use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::model::{
    AssetKind, AssetReference, AssetState, ChapterDocument, Href, ImageState, LinkLabel,
    LinkState, NodeKind,
};
use crate::report::{BuildReport, IssueKind};

/// A planned copy of one image into the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCopy {
    /// Absolute source path under the project root.
    pub from: PathBuf,
    /// File name within the output `images/` directory.
    pub to_name: String,
}

/// Resolve all image and link references in one chapter.
///
/// `index` is the chapter's position in manifest order; it is recorded on
/// each emitted [`AssetReference`] so the bind pass can address the
/// originating node.
pub fn resolve(
    index: usize,
    chapter: &mut ChapterDocument,
    project_root: &Path,
    report: &mut BuildReport,
) -> (Vec<AssetReference>, Vec<ImageCopy>) {
    let mut references = Vec::new();
    let mut copies = Vec::new();

    let chapter_dir = chapter
        .source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let ids: Vec<_> = chapter.tree.walk().collect();
    for id in ids {
        match chapter.tree.node(id).kind.clone() {
            NodeKind::Image {
                state: ImageState::Raw(raw),
                alt,
            } => {
                let (state, reference, copy) =
                    resolve_image(index, id, chapter, &chapter_dir, project_root, &raw, report);
                chapter.tree.node_mut(id).kind = NodeKind::Image { state, alt };
                references.push(reference);
                if let Some(copy) = copy {
                    copies.push(copy);
                }
            }
            NodeKind::Link(LinkState::Raw(raw)) => {
                let (state, reference) = resolve_link(index, id, chapter, &raw);
                chapter.tree.node_mut(id).kind = NodeKind::Link(state);
                references.push(reference);
            }
            _ => {}
        }
    }

    (references, copies)
}

fn resolve_image(
    index: usize,
    node: crate::model::NodeId,
    chapter: &ChapterDocument,
    chapter_dir: &Path,
    project_root: &Path,
    raw: &str,
    report: &mut BuildReport,
) -> (ImageState, AssetReference, Option<ImageCopy>) {
    let make_ref = |state: AssetState| AssetReference {
        chapter: index,
        node,
        origin: chapter.source.clone(),
        raw: raw.to_string(),
        kind: AssetKind::Image,
        state,
    };

    match Href::classify(raw) {
        Href::External(url) => {
            // Remote images are embedded by the export backend, not copied.
            let state = ImageState::Resolved {
                src: url.clone(),
                origin: None,
            };
            (state, make_ref(AssetState::Ok(url)), None)
        }
        Href::Fragment(_) => {
            report.record(IssueKind::BrokenImage, &chapter.source, raw);
            (ImageState::Broken(raw.to_string()), make_ref(AssetState::Broken), None)
        }
        Href::Chapter { path, .. } | Href::Relative(path) => {
            let relative = normalize(&chapter_dir.join(&path));
            let absolute = project_root.join(&relative);
            if absolute.is_file() {
                let name = portable_name(&relative);
                let src = format!("images/{name}");
                debug!("image {} -> {}", raw, src);
                let state = ImageState::Resolved {
                    src: src.clone(),
                    origin: Some(absolute.clone()),
                };
                let copy = ImageCopy {
                    from: absolute,
                    to_name: name,
                };
                (state, make_ref(AssetState::Ok(src)), Some(copy))
            } else {
                report.record(IssueKind::BrokenImage, &chapter.source, raw);
                (
                    ImageState::Broken(raw.to_string()),
                    make_ref(AssetState::Broken),
                    None,
                )
            }
        }
    }
}

fn resolve_link(
    index: usize,
    node: crate::model::NodeId,
    chapter: &ChapterDocument,
    raw: &str,
) -> (LinkState, AssetReference) {
    let make_ref = |kind: AssetKind, state: AssetState| AssetReference {
        chapter: index,
        node,
        origin: chapter.source.clone(),
        raw: raw.to_string(),
        kind,
        state,
    };

    match Href::classify(raw) {
        Href::External(url) | Href::Relative(url) => (
            LinkState::External(url.clone()),
            make_ref(AssetKind::ExternalLink, AssetState::Ok(url)),
        ),
        Href::Fragment(fragment) => (
            LinkState::Deferred(LinkLabel::Fragment(fragment)),
            make_ref(AssetKind::InternalLink, AssetState::Deferred),
        ),
        Href::Chapter { path, fragment } => match fragment {
            Some(fragment) => (
                LinkState::Deferred(LinkLabel::Fragment(fragment)),
                make_ref(AssetKind::InternalLink, AssetState::Deferred),
            ),
            None => {
                let stem = path.strip_suffix(".md").unwrap_or(&path).to_string();
                (
                    LinkState::Deferred(LinkLabel::ChapterStart(stem)),
                    make_ref(AssetKind::InternalLink, AssetState::Deferred),
                )
            }
        },
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Output file name for a copied image.
///
/// Stems that are already plain ASCII alphanumerics (plus `-`/`_`) are kept;
/// anything else is replaced with a stable hash of the stem so the output
/// tree never contains unportable file names. The extension is preserved.
fn portable_name(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = relative
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let portable = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if portable {
        format!("{stem}{ext}")
    } else {
        // Hash the full relative path, not just the stem, so same-named
        // images in different directories cannot collide in images/.
        let digest = sha1_smol::Sha1::from(relative.to_string_lossy().as_bytes()).hexdigest();
        format!("{digest}{ext}")
    }
}
