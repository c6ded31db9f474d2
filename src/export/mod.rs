//! Export surface: HTML synthesis, styling, and backend driver traits.
//!
//! The core pipeline ends at the [`BookDocument`](crate::model::BookDocument);
//! this module turns it into the inputs the rendering backends consume. The
//! backends themselves (PDF rasterizer, EPUB container writer) live outside
//! this crate and plug in through [`PdfRenderer`] and [`EpubPackager`].

mod html;

pub use html::{escape_html, render_body, render_fragments};

use std::io;

use crate::model::TocEntry;

/// One chapter-sized HTML fragment, split at a chapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub title: String,
    pub html: String,
}

/// Book-level metadata handed to export drivers.
#[derive(Debug, Clone, Default)]
pub struct BookMeta {
    pub title: String,
    pub language: String,
    pub identifier: String,
}

impl BookMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: "en".into(),
            identifier: String::new(),
        }
    }
}

/// A base template/stylesheet pair applied uniformly to the assembled
/// document before PDF rendering. Treated as opaque configuration: the only
/// operation is replacing the template's `<body>` content.
#[derive(Debug, Clone)]
pub struct StyleTemplate {
    pub template: String,
    pub stylesheet: String,
}

impl Default for StyleTemplate {
    fn default() -> Self {
        Self {
            template: concat!(
                "<!DOCTYPE html>\n",
                "<html>\n<head>\n<meta charset=\"utf-8\"/>\n",
                "<link rel=\"stylesheet\" href=\"book.css\"/>\n",
                "</head>\n<body>\n</body>\n</html>\n"
            )
            .to_string(),
            stylesheet: concat!(
                "body { font-family: serif; line-height: 1.5; max-width: 42em; margin: 0 auto; padding: 1em; }\n",
                "pre.highlight { background: #f6f6f6; padding: 0.75em; overflow-x: auto; }\n",
                "blockquote { border-left: 3px solid #ccc; margin-left: 0; padding-left: 1em; }\n",
                ".chapter-boundary { page-break-before: always; }\n",
                ".broken-link, .broken-image { color: #b00020; }\n",
            )
            .to_string(),
        }
    }
}

impl StyleTemplate {
    /// Insert the rendered body into the template, replacing whatever the
    /// template's `<body>` contains. Falls back to wrapping the body in a
    /// minimal skeleton when the template has no `<body>` element.
    pub fn merge(&self, body: &str) -> String {
        let open = self
            .template
            .find("<body")
            .and_then(|start| self.template[start..].find('>').map(|end| start + end + 1));
        let close = self.template.rfind("</body>");

        match (open, close) {
            (Some(open), Some(close)) if open <= close => {
                let mut out = String::with_capacity(self.template.len() + body.len());
                out.push_str(&self.template[..open]);
                out.push('\n');
                out.push_str(body);
                out.push_str(&self.template[close..]);
                out
            }
            _ => format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n<style>\n{}\n</style>\n</head>\n<body>\n{}</body>\n</html>\n",
                self.stylesheet, body
            ),
        }
    }
}

/// PDF rendering backend: styled document + stylesheet in, PDF bytes out.
///
/// Long-running by nature; treated as a blocking call with no partial
/// output.
pub trait PdfRenderer {
    fn render(&self, document: &str, stylesheet: &str) -> io::Result<Vec<u8>>;
}

/// EPUB packaging backend: ordered fragments + TOC + metadata in, EPUB
/// container bytes out.
pub trait EpubPackager {
    fn package(
        &self,
        meta: &BookMeta,
        fragments: &[Fragment],
        toc: &[TocEntry],
    ) -> io::Result<Vec<u8>>;
}
