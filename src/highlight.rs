//! Syntax highlighting for assembled code blocks.
//!
//! A purely node-local transform over the assembled book: each code block's
//! raw source is handed to the highlighter and the resulting markup stored
//! alongside it. Node identity, ordering, and anchor/link bindings are
//! untouched, which is why this stage runs strictly after assembly and
//! binding. Unrecognized languages fall back to plain (escaped, not
//! highlighted) rendering rather than failing.

use log::info;
use syntect::html::{ClassedHTMLGenerator, ClassStyle};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::chapter::PLAIN_LANGUAGE;
use crate::model::{BookDocument, NodeKind};
use crate::report::{BuildReport, IssueKind};

/// A code highlighter: `(language, source) -> markup`.
///
/// Returns `None` when the language is unrecognized; the renderer then
/// escapes the raw source verbatim.
pub trait Highlighter {
    fn highlight(&self, language: &str, source: &str) -> Option<String>;
}

/// Syntect-backed highlighter emitting class-annotated HTML spans, so the
/// styling template controls the color scheme via CSS.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, language: &str, source: &str) -> Option<String> {
        if language == PLAIN_LANGUAGE {
            return None;
        }
        let syntax = self.syntaxes.find_syntax_by_token(language)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(source) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .ok()?;
        }
        Some(generator.finalize())
    }
}

/// Replace raw code with highlighted markup throughout the book.
pub fn apply(book: &mut BookDocument, highlighter: &dyn Highlighter, report: &mut BuildReport) {
    let ids: Vec<_> = book.tree.walk().collect();
    let mut highlighted = 0usize;
    for id in ids {
        let NodeKind::CodeBlock { language, source, html: None } = book.tree.node(id).kind.clone()
        else {
            continue;
        };
        match highlighter.highlight(&language, &source) {
            Some(markup) => {
                highlighted += 1;
                book.tree.node_mut(id).kind = NodeKind::CodeBlock {
                    language,
                    source,
                    html: Some(markup),
                };
            }
            None if language != PLAIN_LANGUAGE => {
                report.record_global(
                    IssueKind::UnknownLanguage,
                    format!("unrecognized code language {language:?}"),
                );
            }
            None => {}
        }
    }
    info!("highlighted {highlighted} code blocks");
}
