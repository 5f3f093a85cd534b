//! CLI output formatting.
//!
//! A successful run prints nothing unless `--verbose` is passed. In verbose
//! mode the report reads as an inventory of what was published:
//!
//! ```text
//! Copied 2 files, 1 directory → /site/dist
//! Indexes (output tree)
//!     index.html
//!     sub/index.html
//!
//! Generated 2 index pages
//! ```
//!
//! [`format_build_output`] is pure and returns lines for testability;
//! [`print_build_output`] writes them to stdout.

use crate::config::IndexSource;
use crate::pipeline::BuildReport;

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.index_source == IndexSource::Output || report.copied.files > 0 {
        lines.push(format!(
            "Copied {}, {} → {}",
            plural(report.copied.files, "file", "files"),
            plural(report.copied.directories, "directory", "directories"),
            report.output_root.display()
        ));
    }

    lines.push(format!("Indexes ({} tree)", report.index_source.as_str()));
    for index in &report.indexes {
        lines.push(format!(
            "{}{}",
            indent(1),
            index.to_string_lossy().replace('\\', "/")
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}",
        plural(report.indexes.len(), "index page", "index pages")
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
