//! Arena-held document trees and the book-level document.
//!
//! Nodes are stored in a flat arena addressed by [`NodeId`] rather than as
//! nested owning pointers: headings, anchors, and boundary markers need
//! stable cross-references without ownership cycles.

use std::path::PathBuf;

use super::node::{Node, NodeId, NodeKind};

/// A document tree: a flat node arena rooted at [`NodeId::ROOT`].
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root)],
        }
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append a new node under `parent`, returning its id.
    pub fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Depth-first preorder traversal starting at the root.
    pub fn walk(&self) -> DfsIter<'_> {
        DfsIter {
            tree: self,
            stack: vec![NodeId::ROOT],
        }
    }

    /// Collect the plain text content under `id`, normalizing whitespace.
    ///
    /// Text and inline-code leaves contribute; everything else is
    /// transparent. A separator is inserted only where the source text had
    /// whitespace at the boundary, so adjacent inline runs with no space
    /// between them stay joined. Used for heading titles and slug
    /// derivation.
    pub fn collect_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text_into(id, &mut out);
        out.truncate(out.trim_end().len());
        out
    }

    fn collect_text_into(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) | NodeKind::InlineCode(text) => {
                let leading = text.starts_with(char::is_whitespace);
                let trailing = text.ends_with(char::is_whitespace);
                let words: Vec<&str> = text.split_whitespace().collect();

                if words.is_empty() {
                    // Whitespace-only run (e.g. a soft break) acts as a
                    // separator.
                    if !text.is_empty() && !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                    return;
                }
                if leading && !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(&words.join(" "));
                if trailing {
                    out.push(' ');
                }
            }
            _ => {
                for &child in self.children(id) {
                    self.collect_text_into(child, out);
                }
            }
        }
    }

    /// Deep-copy the children of `id` into `dest` under `dest_parent`,
    /// applying `map` to every copied node kind.
    pub fn graft_into<F>(&self, id: NodeId, dest: &mut Tree, dest_parent: NodeId, map: &mut F)
    where
        F: FnMut(NodeKind) -> NodeKind,
    {
        for &child in self.children(id) {
            let kind = map(self.node(child).kind.clone());
            let copied = dest.push(dest_parent, kind);
            self.graft_into(child, dest, copied, map);
        }
    }
}

/// Depth-first preorder iterator over a [`Tree`].
pub struct DfsIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for DfsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.iter().rev());
        Some(id)
    }
}

/// One parsed chapter, owned independently until merged into the book.
#[derive(Debug, Clone)]
pub struct ChapterDocument {
    /// Source path relative to the project root. Synthetic chapters (part
    /// titles) carry an empty path.
    pub source: PathBuf,
    pub tree: Tree,
    /// Number of headings in this chapter.
    pub heading_count: usize,
    /// Shallowest heading level present (the chapter's own top level).
    pub top_heading_level: Option<u8>,
}

impl ChapterDocument {
    /// An empty chapter standing in for an unreadable source file.
    pub fn empty(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            tree: Tree::new(),
            heading_count: 0,
            top_heading_level: None,
        }
    }
}

/// A flat table-of-contents entry: `(depth, title, anchor)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct TocEntry {
    /// Final (re-leveled) heading depth, 1-6.
    pub depth: u8,
    pub title: String,
    /// Anchor id of the heading in the assembled document.
    pub anchor: String,
}

/// The fully merged book: one tree in manifest order with re-leveled
/// headings, bound links, and chapter-boundary markers, plus the flat TOC
/// derived from the assembled headings.
///
/// Built once, append-only during assembly, immutable once handed to a
/// rendering backend (the highlight adapter is the sole post-assembly
/// transform, and it only touches code-block leaf content).
#[derive(Debug, Clone)]
pub struct BookDocument {
    pub tree: Tree,
    pub toc: Vec<TocEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_walk_preorder() {
        let mut tree = Tree::new();
        let p = tree.push(NodeId::ROOT, NodeKind::Paragraph);
        let a = tree.push(p, NodeKind::Text("a".into()));
        let q = tree.push(NodeId::ROOT, NodeKind::Paragraph);
        let b = tree.push(q, NodeKind::Text("b".into()));

        let order: Vec<NodeId> = tree.walk().collect();
        assert_eq!(order, vec![NodeId::ROOT, p, a, q, b]);
    }

    #[test]
    fn collect_text_normalizes_whitespace() {
        let mut tree = Tree::new();
        let h = tree.push(NodeId::ROOT, NodeKind::Heading { level: 1, id: None });
        tree.push(h, NodeKind::Text("  Setup ".into()));
        let em = tree.push(h, NodeKind::Emphasis);
        tree.push(em, NodeKind::Text("Guide".into()));

        assert_eq!(tree.collect_text(h), "Setup Guide");
    }

    #[test]
    fn collect_text_keeps_adjacent_runs_joined() {
        // `Foo*bar*baz` style headings: no whitespace at the run
        // boundaries, so none may be introduced.
        let mut tree = Tree::new();
        let h = tree.push(NodeId::ROOT, NodeKind::Heading { level: 1, id: None });
        tree.push(h, NodeKind::Text("Foo".into()));
        let em = tree.push(h, NodeKind::Emphasis);
        tree.push(em, NodeKind::Text("bar".into()));
        tree.push(h, NodeKind::Text("baz".into()));

        assert_eq!(tree.collect_text(h), "Foobarbaz");
    }

    #[test]
    fn collect_text_treats_soft_breaks_as_separators() {
        let mut tree = Tree::new();
        let p = tree.push(NodeId::ROOT, NodeKind::Paragraph);
        tree.push(p, NodeKind::Text("one".into()));
        tree.push(p, NodeKind::Text("\n".into()));
        tree.push(p, NodeKind::Text("two".into()));

        assert_eq!(tree.collect_text(p), "one two");
    }

    #[test]
    fn graft_copies_subtree() {
        let mut src = Tree::new();
        let p = src.push(NodeId::ROOT, NodeKind::Paragraph);
        src.push(p, NodeKind::Text("hello".into()));

        let mut dest = Tree::new();
        src.graft_into(NodeId::ROOT, &mut dest, NodeId::ROOT, &mut |k| k);

        assert_eq!(dest.len(), 3);
        let copied_p = dest.children(NodeId::ROOT)[0];
        assert_eq!(dest.node(copied_p).kind, NodeKind::Paragraph);
    }
}
