//! # Diagnostic and Severity Definitions
//!
//! @title Call-Site Diagnostic Data Structures
//! @author Ramprasad
//!
//! Defines the diagnostics emitted for checked call sites and their severity
//! classification.

use colored::*;
use serde::{Deserialize, Serialize};

/// Severity level classification for diagnostics.
///
/// Ordered from lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no direct security impact.
    Info = 0,

    /// Low severity, minimal security impact.
    Low = 1,

    /// Medium severity, moderate security impact.
    Medium = 2,

    /// High severity, significant security impact.
    High = 3,

    /// Critical severity, severe security impact.
    Critical = 4,
}

impl Severity {
    /// Parses a severity level from a string, defaulting to `Info` for
    /// unknown values.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Info,
        }
    }

    /// Returns a colored label for terminal output.
    pub fn colored_label(&self) -> ColoredString {
        match self {
            Severity::Critical => "CRITICAL".white().on_red().bold(),
            Severity::High => "HIGH".black().on_yellow().bold(),
            Severity::Medium => "MEDIUM".white().on_bright_blue().bold(),
            Severity::Low => "LOW".black().on_white().bold(),
            Severity::Info => "INFO".black().on_bright_white(),
        }
    }

    /// Returns a text indicator for the severity.
    pub fn indicator(&self) -> &'static str {
        match self {
            Severity::Critical => "[!!]",
            Severity::High => "[!]",
            Severity::Medium => "[~]",
            Severity::Low => "[-]",
            Severity::Info => "[i]",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

/// What a diagnostic is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A checked argument position carries a possibly tainted value.
    UnsafeArgument,

    /// The receiver type of a policy-vetted method could not be resolved;
    /// usually a policy-authoring gap rather than a vulnerability.
    UnresolvedReceiver,
}

/// One diagnostic for a checked call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What is being reported.
    pub kind: DiagnosticKind,

    /// Severity classification.
    pub severity: Severity,

    /// Receiver class of the offending call, when resolved.
    pub class: String,

    /// Called method name.
    pub method: String,

    /// Offending argument position, for [`DiagnosticKind::UnsafeArgument`].
    pub argument: Option<usize>,

    /// Rendered source text of the offending argument.
    pub source: String,

    /// Class containing the call site.
    pub context_class: String,

    /// Function containing the call site.
    pub context_function: String,

    /// File containing the call site.
    pub file: String,
}

impl Diagnostic {
    /// Human-readable message for this diagnostic.
    pub fn message(&self) -> String {
        match self.kind {
            DiagnosticKind::UnsafeArgument => format!(
                "Unsafe calling method {}::{}. Argument {} contains unsafe values {}. \
                 Class {}, method {}",
                self.class,
                self.method,
                self.argument.unwrap_or_default(),
                self.source,
                self.context_class,
                self.context_function
            ),
            DiagnosticKind::UnresolvedReceiver => format!(
                "Could not determine the receiver type of {}() called in {}::{}; \
                 the call cannot be vetted against the trust policy",
                self.method, self.context_class, self.context_function
            ),
        }
    }

    /// Prints the diagnostic to terminal with color formatting.
    pub fn print_terminal(&self, index: usize) {
        println!();
        println!(
            "{} {} {}",
            format!("#{}", index).cyan().bold(),
            self.severity.colored_label(),
            match self.kind {
                DiagnosticKind::UnsafeArgument =>
                    format!("{}::{}", self.class, self.method).white().bold(),
                DiagnosticKind::UnresolvedReceiver =>
                    format!("{}() (unresolved receiver)", self.method).white().bold(),
            }
        );

        println!(
            "   {} {} in {}::{}",
            "Location:".dimmed(),
            self.file.blue(),
            self.context_class.cyan(),
            self.context_function.cyan()
        );

        if let Some(position) = self.argument {
            println!(
                "   {} argument {} = {}",
                "Unsafe:".yellow(),
                position.to_string().cyan(),
                self.source.bright_white()
            );
        }

        for line in self.message().lines() {
            println!("   {}", line.dimmed());
        }

        println!("{}", "-".repeat(60).dimmed());
    }
}
