//! Pure HTML generation from the assembled book.
//!
//! Renders the [`BookDocument`] tree to HTML for the export drivers: one
//! merged body string for PDF-style backends, or ordered fragments (split
//! at chapter boundaries) for EPUB-style backends. Rendering is a pure
//! function of the tree; all resolution has already happened, so broken
//! links and images render as visible placeholders here rather than being
//! dropped.

use crate::model::{
    BookDocument, CellAlign, ImageState, LinkState, NodeId, NodeKind, TaskState, Tree,
};

use super::Fragment;

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 10);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the whole book body as one HTML string.
pub fn render_body(book: &BookDocument) -> String {
    let mut out = String::new();
    for &child in book.tree.children(NodeId::ROOT) {
        render_node(&book.tree, child, &mut out);
    }
    out
}

/// Render the book as ordered fragments, split at chapter boundaries.
///
/// The first planned entry is always top-level, so every fragment opens
/// with a boundary and carries its title.
pub fn render_fragments(book: &BookDocument) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut title = String::new();
    let mut html = String::new();

    for &child in book.tree.children(NodeId::ROOT) {
        if let NodeKind::Boundary { title: next } = &book.tree.node(child).kind {
            if !html.is_empty() {
                fragments.push(Fragment {
                    title: std::mem::take(&mut title),
                    html: std::mem::take(&mut html),
                });
            }
            title = next.clone();
            continue;
        }
        render_node(&book.tree, child, &mut html);
    }
    if !html.is_empty() {
        fragments.push(Fragment { title, html });
    }
    fragments
}

fn render_children(tree: &Tree, id: NodeId, out: &mut String) {
    for &child in tree.children(id) {
        render_node(tree, child, out);
    }
}

fn render_node(tree: &Tree, id: NodeId, out: &mut String) {
    match &tree.node(id).kind {
        NodeKind::Root => render_children(tree, id, out),
        NodeKind::Boundary { .. } => {
            out.push_str("<div class=\"chapter-boundary\"></div>\n");
        }
        NodeKind::Target(anchor) => {
            out.push_str(&format!("<a id=\"{}\"></a>\n", escape_html(anchor)));
        }
        NodeKind::Heading { level, id: anchor } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<h{level}"));
            if let Some(anchor) = anchor {
                out.push_str(&format!(" id=\"{}\"", escape_html(anchor)));
            }
            out.push('>');
            render_children(tree, id, out);
            out.push_str(&format!("</h{level}>\n"));
        }
        NodeKind::Paragraph => {
            out.push_str("<p>");
            render_children(tree, id, out);
            out.push_str("</p>\n");
        }
        NodeKind::Text(text) => out.push_str(&escape_html(text)),
        NodeKind::Emphasis => wrap(tree, id, out, "em"),
        NodeKind::Strong => wrap(tree, id, out, "strong"),
        NodeKind::Strikethrough => wrap(tree, id, out, "del"),
        NodeKind::InlineCode(code) => {
            out.push_str("<code>");
            out.push_str(&escape_html(code));
            out.push_str("</code>");
        }
        NodeKind::CodeBlock {
            language,
            source,
            html,
        } => {
            out.push_str(&format!(
                "<pre class=\"highlight\"><code class=\"language-{}\">",
                escape_html(language)
            ));
            match html {
                // Highlighter markup is already escaped span soup.
                Some(markup) => out.push_str(markup),
                None => out.push_str(&escape_html(source)),
            }
            out.push_str("</code></pre>\n");
        }
        NodeKind::Link(state) => {
            match state {
                LinkState::External(url) => {
                    out.push_str(&format!("<a href=\"{}\">", escape_html(url)));
                    render_children(tree, id, out);
                    out.push_str("</a>");
                }
                LinkState::Anchor(anchor) => {
                    out.push_str(&format!("<a href=\"#{}\">", escape_html(anchor)));
                    render_children(tree, id, out);
                    out.push_str("</a>");
                }
                // Visible placeholder: the label stays readable, the bad
                // target is kept in the title attribute for inspection.
                LinkState::Broken(raw) => {
                    out.push_str(&format!(
                        "<span class=\"broken-link\" title=\"{}\">",
                        escape_html(raw)
                    ));
                    render_children(tree, id, out);
                    out.push_str("</span>");
                }
                // Unreachable after binding; degrade to plain text.
                LinkState::Raw(_) | LinkState::Deferred(_) => {
                    render_children(tree, id, out);
                }
            }
        }
        NodeKind::Image { state, alt } => match state {
            ImageState::Resolved { src, .. } => {
                out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"/>",
                    escape_html(src),
                    escape_html(alt)
                ));
            }
            ImageState::Broken(raw) | ImageState::Raw(raw) => {
                out.push_str(&format!(
                    "<span class=\"broken-image\">[missing image: {}]</span>",
                    escape_html(raw)
                ));
            }
        },
        NodeKind::List { ordered, start } => {
            if *ordered {
                if *start != 1 {
                    out.push_str(&format!("<ol start=\"{start}\">\n"));
                } else {
                    out.push_str("<ol>\n");
                }
            } else {
                out.push_str("<ul>\n");
            }
            render_children(tree, id, out);
            out.push_str(if *ordered { "</ol>\n" } else { "</ul>\n" });
        }
        NodeKind::ListItem(task) => {
            out.push_str("<li>");
            match task {
                TaskState::Plain => {}
                TaskState::Unchecked => {
                    out.push_str("<input type=\"checkbox\" disabled/> ");
                }
                TaskState::Checked => {
                    out.push_str("<input type=\"checkbox\" disabled checked/> ");
                }
            }
            render_children(tree, id, out);
            out.push_str("</li>\n");
        }
        NodeKind::Table { alignments } => render_table(tree, id, alignments, out),
        // Reached only via render_table.
        NodeKind::TableHead | NodeKind::TableRow | NodeKind::TableCell => {
            render_children(tree, id, out)
        }
        NodeKind::BlockQuote => {
            out.push_str("<blockquote>\n");
            render_children(tree, id, out);
            out.push_str("</blockquote>\n");
        }
        NodeKind::Rule => out.push_str("<hr/>\n"),
        NodeKind::Break => out.push_str("<br/>\n"),
        NodeKind::FootnoteDefinition { label, id: anchor } => {
            out.push_str("<div class=\"footnote\"");
            if let Some(anchor) = anchor {
                out.push_str(&format!(" id=\"{}\"", escape_html(anchor)));
            }
            out.push('>');
            out.push_str(&format!("<sup>{}</sup> ", escape_html(label)));
            render_children(tree, id, out);
            out.push_str("</div>\n");
        }
        NodeKind::FootnoteReference { label, target } => match target {
            Some(anchor) => out.push_str(&format!(
                "<sup class=\"footnote-ref\"><a href=\"#{}\">{}</a></sup>",
                escape_html(anchor),
                escape_html(label)
            )),
            None => out.push_str(&format!(
                "<sup class=\"footnote-ref\">{}</sup>",
                escape_html(label)
            )),
        },
        NodeKind::Html(raw) => out.push_str(raw),
    }
}

fn wrap(tree: &Tree, id: NodeId, out: &mut String, tag: &str) {
    out.push_str(&format!("<{tag}>"));
    render_children(tree, id, out);
    out.push_str(&format!("</{tag}>"));
}

fn render_table(tree: &Tree, id: NodeId, alignments: &[CellAlign], out: &mut String) {
    out.push_str("<table>\n");
    let mut body_open = false;
    for &child in tree.children(id) {
        match &tree.node(child).kind {
            NodeKind::TableHead => {
                out.push_str("<thead><tr>");
                for (col, &cell) in tree.children(child).iter().enumerate() {
                    render_cell(tree, cell, "th", alignments.get(col), out);
                }
                out.push_str("</tr></thead>\n");
            }
            NodeKind::TableRow => {
                if !body_open {
                    out.push_str("<tbody>\n");
                    body_open = true;
                }
                out.push_str("<tr>");
                for (col, &cell) in tree.children(child).iter().enumerate() {
                    render_cell(tree, cell, "td", alignments.get(col), out);
                }
                out.push_str("</tr>\n");
            }
            _ => render_node(tree, child, out),
        }
    }
    if body_open {
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
}

fn render_cell(
    tree: &Tree,
    id: NodeId,
    tag: &str,
    align: Option<&CellAlign>,
    out: &mut String,
) {
    let style = match align {
        Some(CellAlign::Left) => " style=\"text-align: left\"",
        Some(CellAlign::Center) => " style=\"text-align: center\"",
        Some(CellAlign::Right) => " style=\"text-align: right\"",
        _ => "",
    };
    out.push_str(&format!("<{tag}{style}>"));
    render_children(tree, id, out);
    out.push_str(&format!("</{tag}>"));
}
