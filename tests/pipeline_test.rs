//! End-to-end pipeline tests over fixture projects built on disk.

use std::fs;
use std::path::Path;

use bookpress::export::render_body;
use bookpress::model::{ImageState, LinkState, NodeKind};
use bookpress::pipeline;
use bookpress::IssueKind;
use tempfile::TempDir;

/// Build a book project from (path, contents) pairs plus a manifest.
fn project(manifest: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("SUMMARY.md"), manifest).expect("manifest");
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).expect("dirs");
        fs::write(path, contents).expect("chapter");
    }
    dir
}

#[test]
fn toc_and_cross_reference_scenario() {
    // Intro (depth 0), Setup (depth 1), Advanced (depth 0); ch3 forward-
    // and-backward references the Setup heading by slug.
    let dir = project(
        "- [Intro](ch1.md)\n  - [Setup](ch2.md)\n- [Advanced](ch3.md)\n",
        &[
            ("ch1.md", "# Intro\n"),
            ("ch2.md", "# Setup Guide\n"),
            ("ch3.md", "# Advanced\n\n[see Setup](#setup-guide)\n"),
        ],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let toc: Vec<(u8, &str, &str)> = output
        .book
        .toc
        .iter()
        .map(|e| (e.depth, e.title.as_str(), e.anchor.as_str()))
        .collect();
    assert_eq!(
        toc,
        vec![
            (1, "Intro", "intro"),
            (2, "Setup Guide", "setup-guide"),
            (1, "Advanced", "advanced"),
        ]
    );

    let bound = output.book.tree.walk().any(|id| {
        matches!(
            &output.book.tree.node(id).kind,
            NodeKind::Link(LinkState::Anchor(a)) if a == "setup-guide"
        )
    });
    assert!(bound, "link in ch3 should resolve to anchor setup-guide");
    assert!(output.report.is_clean());
}

#[test]
fn missing_image_becomes_placeholder_and_report_entry() {
    let dir = project(
        "- [One](ch1.md)\n",
        &[("ch1.md", "# One\n\n![gone](./img/missing.png)\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let placeholder = output.book.tree.walk().any(|id| {
        matches!(
            &output.book.tree.node(id).kind,
            NodeKind::Image { state: ImageState::Broken(raw), .. } if raw == "./img/missing.png"
        )
    });
    assert!(placeholder, "broken image node must survive assembly");

    let issues: Vec<_> = output.report.of_kind(IssueKind::BrokenImage).collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].origin.as_deref(), Some(Path::new("ch1.md")));
    assert!(issues[0].detail.contains("missing.png"));

    let html = render_body(&output.book);
    assert!(html.contains("broken-image"));
}

#[test]
fn duplicate_heading_text_gets_suffixed_in_manifest_order() {
    let dir = project(
        "- [A](a.md)\n- [B](b.md)\n",
        &[("a.md", "# Overview\n"), ("b.md", "# Overview\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let anchors: Vec<&str> = output.book.toc.iter().map(|e| e.anchor.as_str()).collect();
    assert_eq!(anchors, vec!["overview", "overview-2"]);
    assert_eq!(output.report.of_kind(IssueKind::DuplicateAnchor).count(), 1);
    assert!(output.report.is_clean(), "duplicate anchors are informational");
}

#[test]
fn anchor_ids_are_identical_across_runs() {
    let manifest = "- [A](a.md)\n  - [B](b.md)\n";
    let files = [
        ("a.md", "# Overview\n\n## Details\n"),
        ("b.md", "# Overview\n\n[back](#overview)\n"),
    ];
    let dir = project(manifest, &files);

    let anchors = |out: &pipeline::BuildOutput| {
        out.book
            .toc
            .iter()
            .map(|e| e.anchor.clone())
            .collect::<Vec<_>>()
    };
    let first = pipeline::build(dir.path()).expect("first run");
    let second = pipeline::build(dir.path()).expect("second run");
    assert_eq!(anchors(&first), anchors(&second));
}

#[test]
fn unmatched_link_renders_placeholder_not_omitted() {
    let dir = project(
        "- [One](ch1.md)\n",
        &[("ch1.md", "# One\n\n[dangling](#no-such-heading)\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    assert_eq!(output.report.of_kind(IssueKind::BrokenLink).count(), 1);
    let html = render_body(&output.book);
    assert!(html.contains("broken-link"));
    assert!(html.contains("dangling"), "link label must stay visible");
}

#[test]
fn missing_chapter_skips_branch_but_run_continues() {
    let dir = project(
        "- [One](ch1.md)\n- [Gone](ghost.md)\n  - [Child](child.md)\n- [Two](ch2.md)\n",
        &[
            ("ch1.md", "# One\n"),
            ("child.md", "# Child\n"),
            ("ch2.md", "# Two\n"),
        ],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let titles: Vec<&str> = output.book.toc.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert_eq!(output.report.of_kind(IssueKind::MissingSource).count(), 1);
}

#[test]
fn single_chapter_heading_depths_follow_releveling_contract() {
    let dir = project(
        "- [Only](only.md)\n",
        &[("only.md", "# Top\n\n## Mid\n\n### Deep\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    // Manifest depth 0: top-level heading lands at depth 1, relative
    // nesting preserved.
    let depths: Vec<u8> = output.book.toc.iter().map(|e| e.depth).collect();
    assert_eq!(depths, vec![1, 2, 3]);
}

#[test]
fn recognized_language_is_highlighted_unrecognized_preserved() {
    let dir = project(
        "- [Code](code.md)\n",
        &[(
            "code.md",
            "# Code\n\n```rust\nfn main() {}\n```\n\n```zorblang\nkeep < this & that >\n```\n",
        )],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let blocks: Vec<(String, Option<String>)> = output
        .book
        .tree
        .walk()
        .filter_map(|id| match &output.book.tree.node(id).kind {
            NodeKind::CodeBlock { language, html, .. } => Some((language.clone(), html.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(blocks.len(), 2);

    let (_, rust_html) = blocks.iter().find(|(l, _)| l == "rust").unwrap();
    assert!(rust_html.is_some(), "rust should be highlighted");
    assert_ne!(rust_html.as_deref(), Some("fn main() {}\n"));

    let (_, zorb_html) = blocks.iter().find(|(l, _)| l == "zorblang").unwrap();
    assert!(zorb_html.is_none(), "unknown language stays plain");
    assert_eq!(output.report.of_kind(IssueKind::UnknownLanguage).count(), 1);

    // No data loss: the raw code survives, escaped, in the output.
    let html = render_body(&output.book);
    assert!(html.contains("keep &lt; this &amp; that &gt;"));
}

#[test]
fn part_titles_become_synthetic_chapters() {
    let dir = project(
        "## Getting Started\n\n- [Install](install.md)\n",
        &[("install.md", "# Install\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let toc: Vec<(u8, &str)> = output
        .book
        .toc
        .iter()
        .map(|e| (e.depth, e.title.as_str()))
        .collect();
    assert_eq!(toc, vec![(1, "Getting Started"), (1, "Install")]);
}

#[test]
fn duplicate_inclusion_gets_independent_anchors() {
    let dir = project(
        "- [First](ch.md)\n- [Again](ch.md)\n",
        &[("ch.md", "# Shared\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let anchors: Vec<&str> = output.book.toc.iter().map(|e| e.anchor.as_str()).collect();
    assert_eq!(anchors, vec!["shared", "shared-2"]);
}

#[test]
fn whole_chapter_link_resolves_to_chapter_start() {
    let dir = project(
        "- [One](ch1.md)\n- [Two](guide/ch2.md)\n",
        &[
            ("ch1.md", "# One\n\n[next chapter](guide/ch2.md)\n"),
            ("guide/ch2.md", "# Two\n"),
        ],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let html = render_body(&output.book);
    assert!(html.contains("href=\"#guide-ch2\""));
    assert!(html.contains("<a id=\"guide-ch2\"></a>"));
    assert!(output.report.is_clean());
}

#[test]
fn image_next_to_chapter_is_copied_under_images() {
    let dir = project(
        "- [One](docs/ch1.md)\n",
        &[("docs/ch1.md", "# One\n\n![logo](assets/logo.png)\n")],
    );
    fs::create_dir_all(dir.path().join("docs/assets")).unwrap();
    fs::write(dir.path().join("docs/assets/logo.png"), b"png").unwrap();

    let output = pipeline::build(dir.path()).expect("build succeeds");
    assert_eq!(output.copies.len(), 1);
    assert_eq!(output.copies[0].to_name, "logo.png");
    assert!(render_body(&output.book).contains("src=\"images/logo.png\""));
}

#[test]
fn missing_manifest_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::build(dir.path()).unwrap_err();
    assert!(matches!(err, bookpress::Error::Manifest(_)));
}

#[test]
fn empty_manifest_is_fatal() {
    let dir = project("# Summary\n\nnothing here\n", &[]);
    let err = pipeline::build(dir.path()).unwrap_err();
    assert!(matches!(err, bookpress::Error::NoChapters));
}

#[test]
fn unreadable_chapter_is_reported_and_treated_as_empty() {
    let dir = project(
        "- [Good](good.md)\n- [Bad](bad.md)\n",
        &[("good.md", "# Good\n")],
    );
    fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

    let output = pipeline::build(dir.path()).expect("build succeeds");
    assert_eq!(output.report.of_kind(IssueKind::UnreadableChapter).count(), 1);
    let titles: Vec<&str> = output.book.toc.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Good"]);
}

#[test]
fn footnotes_survive_assembly_with_anchors() {
    let dir = project(
        "- [One](ch1.md)\n",
        &[("ch1.md", "claim[^1]\n\n[^1]: evidence\n")],
    );
    let output = pipeline::build(dir.path()).expect("build succeeds");

    let html = render_body(&output.book);
    assert!(html.contains("href=\"#footnote-1\""));
    assert!(html.contains("id=\"footnote-1\""));
}
