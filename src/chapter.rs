//! Chapter parsing: one Markdown source file into a document tree.
//!
//! Syntax-level parsing is delegated to pulldown-cmark (tables, footnotes,
//! strikethrough, and task lists enabled); this module owns the
//! post-processing: task-list checkboxes become a tri-state on the list
//! item, fenced code blocks are tagged with their declared language
//! (`plain` when absent), and the chapter's heading profile is recorded for
//! later re-leveling.
//!
//! Malformed inline constructs (unterminated emphasis, unmatched brackets)
//! never abort a file; pulldown-cmark treats the offending span as literal
//! text and continues. The only per-chapter fatal condition is a byte
//! stream that cannot be decoded, which the pipeline handles by
//! substituting an empty chapter and reporting it.

use std::path::PathBuf;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use crate::model::{
    CellAlign, ChapterDocument, ImageState, LinkState, NodeId, NodeKind, TaskState, Tree,
};

/// Default language tag for untagged code blocks.
pub const PLAIN_LANGUAGE: &str = "plain";

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// What an open Start tag contributed to the tree.
enum Frame {
    /// A container node; children attach beneath it.
    Node(NodeId),
    /// A code block; inner text accumulates into its source.
    Code(NodeId),
    /// An image; inner text accumulates into its alt text.
    Image(NodeId, String),
    /// Structurally transparent (e.g. an HTML block wrapper).
    Transparent,
}

/// Parse one chapter's source text into a [`ChapterDocument`].
pub fn parse(text: &str, source: impl Into<PathBuf>) -> ChapterDocument {
    let mut tree = Tree::new();
    let mut stack: Vec<Frame> = Vec::new();

    for event in Parser::new_ext(text, parser_options()) {
        match event {
            Event::Start(_) if in_image(&stack) => {
                // Inline markup inside an image contributes alt text only;
                // no tree nodes until the image closes.
                stack.push(Frame::Transparent);
            }
            Event::Start(tag) => {
                let frame = open_tag(&mut tree, &stack, tag);
                stack.push(frame);
            }
            Event::End(_) => {
                match stack.pop() {
                    Some(Frame::Image(id, alt)) => {
                        if let NodeKind::Image { alt: slot, .. } = &mut tree.node_mut(id).kind {
                            *slot = alt;
                        }
                    }
                    Some(_) => {}
                    // pulldown-cmark guarantees balanced events.
                    None => {}
                }
            }
            Event::Text(text) => {
                if in_image(&stack) {
                    if let Some(alt) = alt_slot(&mut stack) {
                        alt.push_str(&text);
                    }
                } else if let Some(Frame::Code(id)) = stack.last() {
                    if let NodeKind::CodeBlock { source, .. } = &mut tree.node_mut(*id).kind {
                        source.push_str(&text);
                    }
                } else {
                    tree.push(parent(&stack), NodeKind::Text(text.into_string()));
                }
            }
            Event::Code(code) => {
                if in_image(&stack) {
                    if let Some(alt) = alt_slot(&mut stack) {
                        alt.push_str(&code);
                    }
                } else {
                    tree.push(parent(&stack), NodeKind::InlineCode(code.into_string()));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if !in_image(&stack) {
                    tree.push(parent(&stack), NodeKind::Html(html.into_string()));
                }
            }
            Event::FootnoteReference(label) => {
                if !in_image(&stack) {
                    tree.push(
                        parent(&stack),
                        NodeKind::FootnoteReference {
                            label: label.into_string(),
                            target: None,
                        },
                    );
                }
            }
            Event::SoftBreak => {
                if in_image(&stack) {
                    if let Some(alt) = alt_slot(&mut stack) {
                        alt.push(' ');
                    }
                } else {
                    tree.push(parent(&stack), NodeKind::Text("\n".into()));
                }
            }
            Event::HardBreak => {
                if in_image(&stack) {
                    if let Some(alt) = alt_slot(&mut stack) {
                        alt.push(' ');
                    }
                } else {
                    tree.push(parent(&stack), NodeKind::Break);
                }
            }
            Event::Rule => {
                tree.push(parent(&stack), NodeKind::Rule);
            }
            Event::TaskListMarker(checked) => {
                let state = if checked {
                    TaskState::Checked
                } else {
                    TaskState::Unchecked
                };
                mark_task(&mut tree, &stack, state);
            }
            // Math and metadata extensions are not enabled.
            _ => {}
        }
    }

    let mut doc = ChapterDocument {
        source: source.into(),
        tree,
        heading_count: 0,
        top_heading_level: None,
    };
    record_heading_profile(&mut doc);
    doc
}

/// Build a synthetic one-heading chapter for a manifest part title.
pub fn synthetic(title: &str) -> ChapterDocument {
    let mut tree = Tree::new();
    let h = tree.push(NodeId::ROOT, NodeKind::Heading { level: 1, id: None });
    tree.push(h, NodeKind::Text(title.to_string()));
    ChapterDocument {
        source: PathBuf::new(),
        tree,
        heading_count: 1,
        top_heading_level: Some(1),
    }
}

/// Whether an image frame is open anywhere on the stack.
fn in_image(stack: &[Frame]) -> bool {
    stack.iter().any(|frame| matches!(frame, Frame::Image(..)))
}

/// Alt-text accumulator of the nearest open image frame, if any.
fn alt_slot(stack: &mut [Frame]) -> Option<&mut String> {
    stack.iter_mut().rev().find_map(|frame| match frame {
        Frame::Image(_, alt) => Some(alt),
        _ => None,
    })
}

/// Innermost open container.
fn parent(stack: &[Frame]) -> NodeId {
    stack
        .iter()
        .rev()
        .find_map(|frame| match frame {
            Frame::Node(id) => Some(*id),
            _ => None,
        })
        .unwrap_or(NodeId::ROOT)
}

fn open_tag(tree: &mut Tree, stack: &[Frame], tag: Tag<'_>) -> Frame {
    let parent = parent(stack);
    match tag {
        Tag::Paragraph => Frame::Node(tree.push(parent, NodeKind::Paragraph)),
        Tag::Heading { level, id, .. } => Frame::Node(tree.push(
            parent,
            NodeKind::Heading {
                level: level as u8,
                id: id.map(|s| s.into_string()),
            },
        )),
        Tag::BlockQuote(_) => Frame::Node(tree.push(parent, NodeKind::BlockQuote)),
        Tag::CodeBlock(kind) => {
            let language = match kind {
                CodeBlockKind::Fenced(info) => {
                    let tag = info.split_whitespace().next().unwrap_or("");
                    if tag.is_empty() {
                        PLAIN_LANGUAGE.to_string()
                    } else {
                        tag.to_string()
                    }
                }
                CodeBlockKind::Indented => PLAIN_LANGUAGE.to_string(),
            };
            Frame::Code(tree.push(
                parent,
                NodeKind::CodeBlock {
                    language,
                    source: String::new(),
                    html: None,
                },
            ))
        }
        Tag::List(start) => Frame::Node(tree.push(
            parent,
            NodeKind::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            },
        )),
        Tag::Item => Frame::Node(tree.push(parent, NodeKind::ListItem(TaskState::Plain))),
        Tag::FootnoteDefinition(label) => Frame::Node(tree.push(
            parent,
            NodeKind::FootnoteDefinition {
                label: label.into_string(),
                id: None,
            },
        )),
        Tag::Table(alignments) => {
            let alignments = alignments
                .into_iter()
                .map(|a| match a {
                    pulldown_cmark::Alignment::None => CellAlign::None,
                    pulldown_cmark::Alignment::Left => CellAlign::Left,
                    pulldown_cmark::Alignment::Center => CellAlign::Center,
                    pulldown_cmark::Alignment::Right => CellAlign::Right,
                })
                .collect();
            Frame::Node(tree.push(parent, NodeKind::Table { alignments }))
        }
        Tag::TableHead => Frame::Node(tree.push(parent, NodeKind::TableHead)),
        Tag::TableRow => Frame::Node(tree.push(parent, NodeKind::TableRow)),
        Tag::TableCell => Frame::Node(tree.push(parent, NodeKind::TableCell)),
        Tag::Emphasis => Frame::Node(tree.push(parent, NodeKind::Emphasis)),
        Tag::Strong => Frame::Node(tree.push(parent, NodeKind::Strong)),
        Tag::Strikethrough => Frame::Node(tree.push(parent, NodeKind::Strikethrough)),
        Tag::Link { dest_url, .. } => Frame::Node(tree.push(
            parent,
            NodeKind::Link(LinkState::Raw(dest_url.into_string())),
        )),
        Tag::Image { dest_url, .. } => Frame::Image(
            tree.push(
                parent,
                NodeKind::Image {
                    state: ImageState::Raw(dest_url.into_string()),
                    alt: String::new(),
                },
            ),
            String::new(),
        ),
        Tag::HtmlBlock => Frame::Transparent,
        // Definition lists, metadata blocks, sub/superscript: extensions
        // not enabled, but keep the builder total.
        _ => Frame::Transparent,
    }
}

/// Set the task state on the innermost open list item.
fn mark_task(tree: &mut Tree, stack: &[Frame], state: TaskState) {
    for frame in stack.iter().rev() {
        if let Frame::Node(id) = frame
            && matches!(tree.node(*id).kind, NodeKind::ListItem(_))
        {
            tree.node_mut(*id).kind = NodeKind::ListItem(state);
            return;
        }
    }
}

fn record_heading_profile(doc: &mut ChapterDocument) {
    let mut count = 0;
    let mut top: Option<u8> = None;
    for id in doc.tree.walk() {
        if let NodeKind::Heading { level, .. } = doc.tree.node(id).kind {
            count += 1;
            top = Some(top.map_or(level, |t: u8| t.min(level)));
        }
    }
    doc.heading_count = count;
    doc.top_heading_level = top;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(doc: &ChapterDocument) -> Vec<NodeKind> {
        doc.tree
            .walk()
            .map(|id| doc.tree.node(id).kind.clone())
            .collect()
    }

    #[test]
    fn headings_and_profile() {
        let doc = parse("## Setup Guide\n\ntext\n\n### Detail\n", "ch.md");
        assert_eq!(doc.heading_count, 2);
        assert_eq!(doc.top_heading_level, Some(2));
    }

    #[test]
    fn task_list_tri_state() {
        let doc = parse("- [x] done\n- [ ] todo\n- plain\n", "ch.md");
        let states: Vec<TaskState> = kinds_of(&doc)
            .into_iter()
            .filter_map(|k| match k {
                NodeKind::ListItem(state) => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![TaskState::Checked, TaskState::Unchecked, TaskState::Plain]
        );
    }

    #[test]
    fn code_block_language_defaults_to_plain() {
        let doc = parse("```\nno tag\n```\n\n```rust\nfn main() {}\n```\n", "ch.md");
        let langs: Vec<String> = kinds_of(&doc)
            .into_iter()
            .filter_map(|k| match k {
                NodeKind::CodeBlock { language, .. } => Some(language),
                _ => None,
            })
            .collect();
        assert_eq!(langs, vec!["plain", "rust"]);
    }

    #[test]
    fn code_block_source_is_verbatim() {
        let doc = parse("```rust\nlet x = 1;\nlet y = 2;\n```\n", "ch.md");
        let source = kinds_of(&doc)
            .into_iter()
            .find_map(|k| match k {
                NodeKind::CodeBlock { source, .. } => Some(source),
                _ => None,
            })
            .unwrap();
        assert_eq!(source, "let x = 1;\nlet y = 2;\n");
    }

    #[test]
    fn malformed_inline_degrades_to_literal_text() {
        let doc = parse("a [dangling bracket and *unclosed emphasis\n", "ch.md");
        let text = doc.tree.collect_text(NodeId::ROOT);
        assert!(text.contains("[dangling bracket"));
        assert!(text.contains("*unclosed emphasis"));
    }

    #[test]
    fn image_alt_is_collected() {
        let doc = parse("![a *nice* diagram](img/d.png)\n", "ch.md");
        let (state, alt) = kinds_of(&doc)
            .into_iter()
            .find_map(|k| match k {
                NodeKind::Image { state, alt } => Some((state, alt)),
                _ => None,
            })
            .unwrap();
        assert_eq!(state, ImageState::Raw("img/d.png".into()));
        assert_eq!(alt, "a nice diagram");
    }

    #[test]
    fn inline_markup_in_alt_leaves_no_stray_nodes() {
        // Emphasis inside the alt run must not escape the image and attach
        // to the surrounding paragraph.
        let doc = parse("before ![a *nice* `d`](img/d.png) after\n", "ch.md");
        let kinds = kinds_of(&doc);

        assert!(!kinds.iter().any(|k| matches!(k, NodeKind::Emphasis)));
        assert!(!kinds.iter().any(|k| matches!(k, NodeKind::InlineCode(_))));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| matches!(k, NodeKind::Image { .. }))
                .count(),
            1
        );
        let alt = kinds
            .iter()
            .find_map(|k| match k {
                NodeKind::Image { alt, .. } => Some(alt.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(alt, "a nice d");
        assert_eq!(doc.tree.collect_text(NodeId::ROOT), "before after");
    }

    #[test]
    fn footnotes_produce_definition_and_reference() {
        let doc = parse("text[^1]\n\n[^1]: the note\n", "ch.md");
        let kinds = kinds_of(&doc);
        assert!(kinds
            .iter()
            .any(|k| matches!(k, NodeKind::FootnoteReference { label, .. } if label == "1")));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, NodeKind::FootnoteDefinition { label, .. } if label == "1")));
    }

    #[test]
    fn tables_are_structured() {
        let doc = parse("| a | b |\n|---|---|\n| 1 | 2 |\n", "ch.md");
        let kinds = kinds_of(&doc);
        assert!(kinds.iter().any(|k| matches!(k, NodeKind::Table { .. })));
        assert!(kinds.iter().any(|k| matches!(k, NodeKind::TableHead)));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| matches!(k, NodeKind::TableCell))
                .count(),
            4
        );
    }

    #[test]
    fn explicit_heading_id_is_kept() {
        let doc = parse("# Intro {#custom-id}\n", "ch.md");
        let id = kinds_of(&doc)
            .into_iter()
            .find_map(|k| match k {
                NodeKind::Heading { id, .. } => Some(id),
                _ => None,
            })
            .unwrap();
        assert_eq!(id, Some("custom-id".into()));
    }

    #[test]
    fn synthetic_chapter_is_one_heading() {
        let doc = synthetic("Getting Started");
        assert_eq!(doc.heading_count, 1);
        assert_eq!(doc.top_heading_level, Some(1));
        assert_eq!(doc.tree.collect_text(NodeId::ROOT), "Getting Started");
    }
}
