//! Pure slug generation for heading anchors.
//!
//! Generates GitHub-style slugs from heading text for use in anchor ids,
//! internal links, and the table of contents.

/// Generate a GitHub-style slug from text.
///
/// ASCII alphanumerics are lowercased; whitespace, `-`, and `_` become a
/// single hyphen; every other character is dropped. Leading and trailing
/// hyphens are trimmed.
///
/// # Examples
///
/// ```
/// use bookpress::slug::slugify;
///
/// assert_eq!(slugify("Setup Guide"), "setup-guide");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_')
            && !slug.is_empty()
            && !slug.ends_with('-')
        {
            slug.push('-');
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slugify with a fallback for text that slugs to nothing (e.g. headings
/// made entirely of punctuation or non-ASCII characters). Such headings
/// still need an addressable anchor.
pub fn slugify_or(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}
