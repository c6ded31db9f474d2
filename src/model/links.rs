//! Href classification for cross-chapter links and images.
//!
//! Book projects use three addressing modes:
//! - **External**: absolute URLs (`https://...`, `mailto:...`), passed
//!   through untouched and never validated for reachability.
//! - **Fragment**: `#setup-guide`, matched against anchor ids by slug.
//! - **Chapter-relative**: `other.md` or `other.md#section`, rewritten to
//!   book-internal anchors since the assembled output is a single document.
//!
//! Hrefs are percent-decoded before classification; authors frequently
//! percent-encode spaces in relative paths.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;

use super::node::NodeId;

/// A classified href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Href {
    /// External URL (http://, https://, mailto:, tel:).
    External(String),
    /// Fragment-only target (`#id`).
    Fragment(String),
    /// Link to another chapter file, optionally with a fragment.
    Chapter {
        path: String,
        fragment: Option<String>,
    },
    /// Any other relative target (non-Markdown file, bare path). Passed
    /// through unchanged, like external links.
    Relative(String),
}

impl Href {
    /// Percent-decode and classify a raw href string.
    pub fn classify(raw: &str) -> Href {
        let decoded = percent_decode_str(raw.trim()).decode_utf8_lossy();
        let href = decoded.as_ref();

        if href.starts_with("http://")
            || href.starts_with("https://")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return Href::External(href.to_string());
        }

        if let Some(fragment) = href.strip_prefix('#') {
            return Href::Fragment(fragment.to_string());
        }

        // `chapter.md` or `chapter.md#section`
        match href.split_once('#') {
            Some((path, fragment)) if path.ends_with(".md") => Href::Chapter {
                path: path.to_string(),
                fragment: Some(fragment.to_string()),
            },
            None if href.ends_with(".md") => Href::Chapter {
                path: href.to_string(),
                fragment: None,
            },
            _ => Href::Relative(href.to_string()),
        }
    }

    /// Whether this target leaves the book.
    pub fn is_external(&self) -> bool {
        matches!(self, Href::External(_) | Href::Relative(_))
    }
}

/// Kind of a tracked reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum AssetKind {
    Image,
    InternalLink,
    ExternalLink,
}

/// Resolution state of a tracked reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    /// Resolved to a concrete target (path or URL).
    Ok(String),
    /// Internal link awaiting the book-wide bind pass.
    Deferred,
    /// Unresolvable; surfaced as a placeholder node and a report entry.
    Broken,
}

/// One reference discovered during asset resolution.
///
/// `chapter` and `node` address the originating node so the bind pass can
/// rewrite it in place once all anchors are registered.
#[derive(Debug, Clone)]
pub struct AssetReference {
    /// Index of the originating chapter in manifest order.
    pub chapter: usize,
    pub node: NodeId,
    /// Source path of the originating chapter.
    pub origin: PathBuf,
    pub raw: String,
    pub kind: AssetKind,
    pub state: AssetState,
}
