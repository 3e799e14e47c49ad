//! # Report Generation Module
//!
//! @title Analysis Report Generator
//! @author Ramprasad
//!
//! Aggregates call-site diagnostics into a report and renders it as terminal
//! output, Markdown, or JSON for CI/CD integration.
//!
//! ## Key Types
//!
//! - [`Report`] - Complete analysis report
//! - [`Diagnostic`] - Individual call-site diagnostic
//! - [`Severity`] - Severity classification for diagnostics

mod diagnostic;
mod formatter;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};

use colored::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete analysis report.
///
/// Contains metadata about the run, all diagnostics, and summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the analysis run.
    pub metadata: ReportMetadata,

    /// All diagnostics from the analysis.
    pub diagnostics: Vec<Diagnostic>,

    /// Summary statistics by severity.
    pub summary: ReportSummary,
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Tool version used for the run.
    pub version: String,

    /// Timestamp when the run finished.
    pub timestamp: String,

    /// Path that was analyzed.
    pub analyzed_path: String,

    /// Number of node-stream files analyzed.
    pub files_analyzed: usize,
}

/// Summary of diagnostics by severity level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Count of critical severity diagnostics.
    pub critical: usize,

    /// Count of high severity diagnostics.
    pub high: usize,

    /// Count of medium severity diagnostics.
    pub medium: usize,

    /// Count of low severity diagnostics.
    pub low: usize,

    /// Count of informational diagnostics.
    pub info: usize,

    /// Total count of all diagnostics.
    pub total: usize,
}

impl Report {
    /// Creates a new report from a collection of diagnostics.
    ///
    /// Automatically calculates summary statistics.
    pub fn new(diagnostics: Vec<Diagnostic>, analyzed_path: PathBuf, files_analyzed: usize) -> Self {
        let summary = ReportSummary::from_diagnostics(&diagnostics);

        let metadata = ReportMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono_lite_timestamp(),
            analyzed_path: analyzed_path.display().to_string(),
            files_analyzed,
        };

        Self {
            metadata,
            diagnostics,
            summary,
        }
    }

    /// Whether any diagnostic is at or above the given severity.
    pub fn has_at_least(&self, min: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= min)
    }

    /// Prints colorized output to the terminal.
    pub fn print_terminal(&self) {
        if self.diagnostics.is_empty() {
            println!("\n{}", "[+] No unsafe call sites found.".green().bold());
            return;
        }

        println!("\n{}", "[!] Unsafe Call Sites:".red().bold());
        println!("{}", "=".repeat(60).cyan());

        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            diagnostic.print_terminal(i + 1);
        }
    }

    /// Prints summary statistics to the terminal.
    pub fn print_summary(&self) {
        println!(
            "{}",
            format!(
                "[*] Summary: {} Critical | {} High | {} Medium | {} Low | {} Info",
                self.summary.critical,
                self.summary.high,
                self.summary.medium,
                self.summary.low,
                self.summary.info
            )
            .bold()
        );

        if self.summary.total == 0 {
            println!("{}", "[+] No issues found.".green().bold());
        } else if self.summary.critical > 0 || self.summary.high > 0 {
            println!(
                "{}",
                format!("[!] Total: {} issue(s) found", self.summary.total)
                    .red()
                    .bold()
            );
        } else {
            println!(
                "{}",
                format!("[!] Total: {} issue(s) found", self.summary.total)
                    .blue()
                    .bold()
            );
        }
    }

    /// Converts the report to Markdown format.
    pub fn to_markdown(&self) -> String {
        formatter::to_markdown(self)
    }
}

impl ReportSummary {
    /// Creates a summary from a collection of diagnostics.
    fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = ReportSummary {
            critical: 0,
            high: 0,
            medium: 0,
            low: 0,
            info: 0,
            total: diagnostics.len(),
        };

        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }

        summary
    }
}

/// Generates a simple timestamp without external dependencies.
fn chrono_lite_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(severity: Severity) -> Diagnostic {
        Diagnostic {
            kind: DiagnosticKind::UnsafeArgument,
            severity,
            class: "QueryBuilder".to_string(),
            method: "where".to_string(),
            argument: Some(0),
            source: "$input".to_string(),
            context_class: "Repo".to_string(),
            context_function: "find".to_string(),
            file: "repo.php".to_string(),
        }
    }

    #[test]
    fn test_report_creation() {
        let report = Report::new(
            vec![diag(Severity::High), diag(Severity::Info)],
            PathBuf::from("./streams"),
            3,
        );

        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.info, 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.metadata.files_analyzed, 3);
    }

    #[test]
    fn test_has_at_least() {
        let report = Report::new(vec![diag(Severity::Info)], PathBuf::from("."), 1);
        assert!(report.has_at_least(Severity::Info));
        assert!(!report.has_at_least(Severity::High));

        let report = Report::new(vec![diag(Severity::High)], PathBuf::from("."), 1);
        assert!(report.has_at_least(Severity::High));
        assert!(!report.has_at_least(Severity::Critical));
    }

    #[test]
    fn test_json_roundtrip() {
        let report = Report::new(vec![diag(Severity::High)], PathBuf::from("."), 1);
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.total, 1);
        assert_eq!(back.diagnostics[0].method, "where");
    }
}
