//! # CLI Module
//!
//! @title Command Line Interface
//! @author Ramprasad
//!
//! This module defines the command-line interface for Query-Sentinel using
//! the `clap` derive macros for declarative argument parsing.
//!
//! ## Commands
//!
//! - `analyze` - Classify node streams against the trust policy
//! - `policy` - Show the effective merged trust policy
//! - `version` - Show version information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query-Sentinel command-line interface.
///
/// A policy-driven SQL injection trust analyzer for query-builder call
/// sites. Classifies exported node streams and reports every vetted call
/// that receives a possibly tainted argument.
#[derive(Parser, Debug)]
#[command(name = "query-sentinel")]
#[command(author = "RamprasadGoud")]
#[command(version)]
#[command(about = "Policy-driven SQL injection trust analyzer for query-builder call sites")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the Query-Sentinel CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze node-stream files against the trust policy.
    ///
    /// Classifies every statement-level call in the given streams and
    /// reports vetted calls receiving possibly tainted arguments.
    Analyze {
        /// Path to a node-stream file or a directory of them.
        ///
        /// If a directory is specified, all `.json` files within it will be
        /// analyzed.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Directories to search for `trusted_data.json` policy files.
        ///
        /// All discovered files are merged over the built-in policy in
        /// discovery order. May be given multiple times.
        #[arg(short, long = "policy-root", value_name = "DIR")]
        policy_roots: Vec<PathBuf>,

        /// Output format for the report.
        ///
        /// Supported formats:
        /// - `terminal`: Colorized console output (default)
        /// - `json`: Machine-readable JSON format
        /// - `markdown`: Human-readable Markdown report
        #[arg(short, long, default_value = "terminal")]
        format: String,

        /// Output file for the report.
        ///
        /// If not specified, the report is printed to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum severity level to include in results.
        ///
        /// Valid values: critical, high, medium, low, info
        #[arg(short, long)]
        severity: Option<String>,

        /// Only vet statement-level calls whose receiver is the current
        /// object.
        #[arg(long)]
        this_only: bool,

        /// Also classify the index expression of array element accesses.
        #[arg(long)]
        strict_index: bool,
    },

    /// Show the effective merged trust policy.
    ///
    /// Discovers and merges all policy files under the given roots, then
    /// prints per-table entry counts and the contributing files.
    Policy {
        /// Directories to search for `trusted_data.json` policy files.
        #[arg(value_name = "DIR")]
        policy_roots: Vec<PathBuf>,
    },

    /// Print version information.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify that the CLI definition is valid.
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "query-sentinel",
            "analyze",
            "streams/",
            "--policy-root",
            "config/",
            "--format",
            "json",
            "--this-only",
        ]);
        match cli.command {
            Commands::Analyze {
                path,
                policy_roots,
                format,
                this_only,
                strict_index,
                ..
            } => {
                assert_eq!(path, PathBuf::from("streams/"));
                assert_eq!(policy_roots, vec![PathBuf::from("config/")]);
                assert_eq!(format, "json");
                assert!(this_only);
                assert!(!strict_index);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
