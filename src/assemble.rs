//! Book assembly: merging chapter trees into one document.
//!
//! Walks the planned chapter list (the manifest flattened depth-first, in
//! sibling order) and inlines each chapter's post-processed tree at its
//! position. A chapter included at manifest depth `d` has its own top-level
//! heading mapped to output depth `d + 1`, with all nested headings shifted
//! by the same offset so relative nesting is preserved (clamped to the
//! 1..=6 range). A chapter-boundary marker precedes each top-level entry,
//! signaling forced pagination to export drivers.
//!
//! The flat table of contents is derived from the assembled tree itself —
//! every heading, in document order, with its final depth and anchor id —
//! so it cannot diverge from the body content.

use crate::anchors::Registry;
use crate::manifest::PlannedChapter;
use crate::model::{BookDocument, ChapterDocument, NodeId, NodeKind, TocEntry, Tree};

/// Merge all chapters, in manifest order, into a single [`BookDocument`].
///
/// `planned` and `chapters` are parallel: `chapters[i]` is the parsed
/// document for `planned[i]`. The registry must already have assigned final
/// anchor ids (headings carry them in their nodes by now).
pub fn assemble(
    planned: &[PlannedChapter],
    chapters: &[ChapterDocument],
    registry: &Registry,
) -> BookDocument {
    debug_assert_eq!(planned.len(), chapters.len());

    let mut tree = Tree::new();

    for (index, (plan, chapter)) in planned.iter().zip(chapters).enumerate() {
        if plan.depth == 0 {
            tree.push(
                NodeId::ROOT,
                NodeKind::Boundary {
                    title: plan.title.clone(),
                },
            );
        }
        if let Some(start) = registry.chapter_start(index) {
            tree.push(NodeId::ROOT, NodeKind::Target(start.to_string()));
        }

        // Top-level heading of this chapter lands at manifest depth + 1.
        let target_top = plan.depth as i16 + 1;
        let shift = match chapter.top_heading_level {
            Some(top) => target_top - top as i16,
            None => 0,
        };

        chapter
            .tree
            .graft_into(NodeId::ROOT, &mut tree, NodeId::ROOT, &mut |kind| {
                match kind {
                    NodeKind::Heading { level, id } => NodeKind::Heading {
                        level: relevel(level, shift),
                        id,
                    },
                    other => other,
                }
            });
    }

    let toc = build_toc(&tree);
    BookDocument { tree, toc }
}

fn relevel(level: u8, shift: i16) -> u8 {
    (level as i16 + shift).clamp(1, 6) as u8
}

/// Flat TOC view: every heading of the final document in order.
fn build_toc(tree: &Tree) -> Vec<TocEntry> {
    tree.walk()
        .filter_map(|id| match &tree.node(id).kind {
            NodeKind::Heading {
                level,
                id: Some(anchor),
            } => Some(TocEntry {
                depth: *level,
                title: tree.collect_text(id),
                anchor: anchor.clone(),
            }),
            _ => None,
        })
        .collect()
}
