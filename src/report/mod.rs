pub mod types;

pub use types::{BackfillSummary, EnrichSummary, RunSummary};

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Output the run summary to terminal (default) or to a markdown file.
#[instrument(skip(summary), fields(stage = summary.title(), inserted = summary.inserted()))]
pub fn output(summary: &RunSummary, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing summary to terminal");
            print_terminal_summary(summary);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing summary to markdown file");
            write_markdown_summary(summary, path)
        }
    }
}

/// Format and print the summary to the terminal with colors.
///
/// ═══ Backfill: DEMO ═══
///   Bugs fetched ............... 12
///   ...
///
/// ═══ 3 new record(s) written ═══
fn print_terminal_summary(summary: &RunSummary) {
    println!();
    match summary {
        RunSummary::Backfill(s) => println!("═══ {}: {} ═══", summary.title(), s.project.bold()),
        RunSummary::Enrich(_) => println!("═══ {} ═══", summary.title()),
    }

    for (label, value) in summary.rows() {
        println!("  {:.<32} {}", format!("{} ", label), value);
    }
    println!();

    let verdict = match (summary.inserted(), summary.failures()) {
        (0, 0) => "Nothing new to write".dimmed(),
        (n, 0) => format!("{} new record(s) written", n).green().bold(),
        (n, f) => format!("{} new record(s) written, {} item(s) skipped on error", n, f)
            .yellow()
            .bold(),
    };
    println!("═══ {} ═══", verdict);
    println!();
}

/// Write the summary as a markdown file.
///
/// # Backfill: DEMO
///
/// | Metric | Count |
/// |---|---|
/// | Bugs fetched | 12 |
fn write_markdown_summary(summary: &RunSummary, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    match summary {
        RunSummary::Backfill(s) => md.push_str(&format!("# {}: {}\n\n", summary.title(), s.project)),
        RunSummary::Enrich(_) => md.push_str(&format!("# {}\n\n", summary.title())),
    }

    md.push_str("| Metric | Count |\n|---|---|\n");
    for (label, value) in summary.rows() {
        md.push_str(&format!("| {} | {} |\n", label, value));
    }
    md.push('\n');

    if summary.failures() > 0 {
        md.push_str(&format!(
            "**{} item(s) skipped on error; see logs.**\n",
            summary.failures()
        ));
    }

    std::fs::write(path, md)?;
    Ok(())
}
