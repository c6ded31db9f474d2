//! bookpress - Markdown book assembler

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bookpress::export::{render_body, StyleTemplate};
use bookpress::pipeline;

#[derive(Parser)]
#[command(name = "bookpress")]
#[command(version, about = "Assemble a Markdown book project into a single document", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookpress docs/                 Assemble docs/SUMMARY.md into build/
    bookpress docs/ -o out/         Write output to out/
    bookpress docs/ --report-json   Print the issue report as JSON")]
struct Cli {
    /// Book project directory (must contain SUMMARY.md)
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Output directory for the assembled document and images
    #[arg(short, long, default_value = "build")]
    output: PathBuf,

    /// Print the issue report as JSON on stdout
    #[arg(long)]
    report_json: bool,

    /// Suppress progress and report output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let output = pipeline::build(&cli.project).map_err(|e| e.to_string())?;

    let images_dir = cli.output.join("images");
    fs::create_dir_all(&images_dir).map_err(|e| e.to_string())?;
    for copy in &output.copies {
        if let Err(e) = fs::copy(&copy.from, images_dir.join(&copy.to_name)) {
            eprintln!("warning: copying {}: {e}", copy.from.display());
        }
    }

    let template = load_template(&cli.project);
    let document = template.merge(&render_body(&output.book));
    let final_html = cli.output.join("final.html");
    fs::write(&final_html, document).map_err(|e| e.to_string())?;
    // The template links book.css; ship the stylesheet next to the document.
    fs::write(cli.output.join("book.css"), &template.stylesheet).map_err(|e| e.to_string())?;

    if cli.report_json {
        let json = serde_json::to_string_pretty(&output.report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else if !cli.quiet {
        println!("Assembled: {}", final_html.display());
        println!("Chapters: {}", count_boundaries(&output));
        println!("TOC entries: {}", output.book.toc.len());
        println!("Images: {}", output.copies.len());
        for issue in &output.report.issues {
            eprintln!("warning: {issue}");
        }
    }

    Ok(())
}

/// Use the project's own `start.html`/`book.css` pair when present.
fn load_template(project: &std::path::Path) -> StyleTemplate {
    let mut template = StyleTemplate::default();
    if let Ok(text) = fs::read_to_string(project.join("start.html")) {
        template.template = text;
    }
    if let Ok(css) = fs::read_to_string(project.join("book.css")) {
        template.stylesheet = css;
    }
    template
}

fn count_boundaries(output: &bookpress::pipeline::BuildOutput) -> usize {
    use bookpress::model::NodeKind;
    output
        .book
        .tree
        .walk()
        .filter(|&id| matches!(output.book.tree.node(id).kind, NodeKind::Boundary { .. }))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_writes_document_and_stylesheet() {
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("SUMMARY.md"), "- [One](ch1.md)\n").unwrap();
        fs::write(project.path().join("ch1.md"), "# One\n").unwrap();
        let out = tempfile::tempdir().unwrap();

        let cli = Cli {
            project: project.path().to_path_buf(),
            output: out.path().to_path_buf(),
            report_json: false,
            quiet: true,
        };
        run(&cli).unwrap();

        let html = fs::read_to_string(out.path().join("final.html")).unwrap();
        assert!(html.contains("<h1"));
        let css = fs::read_to_string(out.path().join("book.css")).unwrap();
        assert!(!css.is_empty(), "default stylesheet must be written");
    }

    #[test]
    fn project_stylesheet_overrides_default() {
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("SUMMARY.md"), "- [One](ch1.md)\n").unwrap();
        fs::write(project.path().join("ch1.md"), "# One\n").unwrap();
        fs::write(project.path().join("book.css"), "p { color: teal; }\n").unwrap();
        let out = tempfile::tempdir().unwrap();

        let cli = Cli {
            project: project.path().to_path_buf(),
            output: out.path().to_path_buf(),
            report_json: false,
            quiet: true,
        };
        run(&cli).unwrap();

        let css = fs::read_to_string(out.path().join("book.css")).unwrap();
        assert_eq!(css, "p { color: teal; }\n");
    }
}
