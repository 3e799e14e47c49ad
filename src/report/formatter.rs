//! # Markdown Report Formatter
//!
//! Renders a [`Report`] as a Markdown document suitable for commit comments
//! and CI artifacts.

use super::{DiagnosticKind, Report};

/// Converts a report to Markdown.
pub fn to_markdown(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("# Query Sentinel Report\n\n");
    out.push_str(&format!(
        "- **Analyzed**: `{}`\n- **Files**: {}\n- **Version**: {}\n\n",
        report.metadata.analyzed_path, report.metadata.files_analyzed, report.metadata.version
    ));

    out.push_str("## Summary\n\n");
    out.push_str("| Severity | Count |\n|----------|-------|\n");
    out.push_str(&format!("| Critical | {} |\n", report.summary.critical));
    out.push_str(&format!("| High | {} |\n", report.summary.high));
    out.push_str(&format!("| Medium | {} |\n", report.summary.medium));
    out.push_str(&format!("| Low | {} |\n", report.summary.low));
    out.push_str(&format!("| Info | {} |\n", report.summary.info));
    out.push_str(&format!("| **Total** | **{}** |\n\n", report.summary.total));

    if report.diagnostics.is_empty() {
        out.push_str("No unsafe call sites found.\n");
        return out;
    }

    out.push_str("## Diagnostics\n\n");
    for (i, diagnostic) in report.diagnostics.iter().enumerate() {
        let title = match diagnostic.kind {
            DiagnosticKind::UnsafeArgument => {
                format!("`{}::{}`", diagnostic.class, diagnostic.method)
            }
            DiagnosticKind::UnresolvedReceiver => {
                format!("`{}()` (unresolved receiver)", diagnostic.method)
            }
        };

        out.push_str(&format!(
            "### {}. {} {}\n\n",
            i + 1,
            diagnostic.severity.indicator(),
            title
        ));
        out.push_str(&format!(
            "- **File**: `{}`\n- **Context**: `{}::{}`\n",
            diagnostic.file, diagnostic.context_class, diagnostic.context_function
        ));
        if let Some(position) = diagnostic.argument {
            out.push_str(&format!(
                "- **Argument {}**: `{}`\n",
                position, diagnostic.source
            ));
        }
        out.push('\n');
        out.push_str(&diagnostic.message());
        out.push_str("\n\n");
    }

    out
}
