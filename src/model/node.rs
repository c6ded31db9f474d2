//! Node types for the document tree.

use std::path::PathBuf;

/// Unique identifier for a node within a [`Tree`](super::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node ID (always 0).
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Checkbox state of a list item.
///
/// Task-list syntax (`- [ ]` / `- [x]`) is normalized into this tri-state
/// during chapter parsing; ordinary list items are `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Plain,
    Unchecked,
    Checked,
}

/// Column alignment for table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellAlign {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Resolution state of a link node.
///
/// Links start `Raw`, become `Deferred` when the asset resolver recognizes
/// them as internal (the target anchor may not exist yet), and end up either
/// `Anchor` (bound) or `Broken` after the registry's bind pass. External
/// URLs pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// As parsed from the source, not yet classified.
    Raw(String),
    /// External URL, never validated for reachability.
    External(String),
    /// Internal link awaiting the book-wide bind pass.
    Deferred(LinkLabel),
    /// Bound to a final anchor id.
    Anchor(String),
    /// No matching anchor; the raw target is kept for the placeholder.
    Broken(String),
}

/// What a deferred internal link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkLabel {
    /// A `#fragment` target, matched against anchor ids by slug.
    Fragment(String),
    /// A whole-chapter target (`other.md`), matched against the
    /// chapter-start anchor derived from the source path stem.
    ChapterStart(String),
}

/// Resolution state of an image node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// As parsed from the source.
    Raw(String),
    /// Rewritten to its location in the build output (or an external URL).
    Resolved { src: String, origin: Option<PathBuf> },
    /// File not found under the project root; rendered as a placeholder.
    Broken(String),
}

/// Kind of a node in the document tree.
///
/// Kinds map to Markdown concepts. Leaf kinds (`Text`, `CodeBlock`, `Rule`,
/// `Break`, `Target`) carry their content inline; container kinds hold
/// children in the owning [`Tree`](super::Tree).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root document node.
    Root,
    /// Chapter-boundary marker inserted before each top-level manifest
    /// entry; signals forced pagination to export drivers.
    Boundary { title: String },
    /// Invisible anchor target (`<a id=...>`), e.g. a chapter-start anchor.
    Target(String),
    /// Heading with level 1-6. `id` starts as the explicitly declared id
    /// (if any) and is replaced by the registry with the final unique
    /// anchor id.
    Heading { level: u8, id: Option<String> },
    Paragraph,
    /// Leaf text content.
    Text(String),
    Emphasis,
    Strong,
    Strikethrough,
    /// Inline code span.
    InlineCode(String),
    /// Fenced or indented code block. `language` defaults to `plain` when
    /// no tag is declared; `html` is filled by the highlight adapter for
    /// recognized languages and stays `None` otherwise.
    CodeBlock {
        language: String,
        source: String,
        html: Option<String>,
    },
    Link(LinkState),
    Image { state: ImageState, alt: String },
    List { ordered: bool, start: u64 },
    ListItem(TaskState),
    Table { alignments: Vec<CellAlign> },
    TableHead,
    TableRow,
    TableCell,
    BlockQuote,
    /// Horizontal rule.
    Rule,
    /// Hard line break.
    Break,
    /// Footnote definition. `id` is assigned by the registry.
    FootnoteDefinition { label: String, id: Option<String> },
    /// Footnote reference; `target` is bound to the definition's anchor.
    FootnoteReference { label: String, target: Option<String> },
    /// Raw HTML passed through from the source.
    Html(String),
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Whether this node is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, NodeKind::Heading { .. })
    }
}
