//! # Query-Sentinel CLI Entry Point
//!
//! @title Query-Sentinel CLI
//! @author Ramprasad
//!
//! This module provides the main entry point for the Query-Sentinel
//! command-line trust analyzer.

use anyhow::Result;
use clap::Parser;
use colored::*;
use query_sentinel::analysis::{Analyzer, AnalyzerOptions};
use query_sentinel::ir::NodeStream;
use query_sentinel::policy::PolicyLoader;
use query_sentinel::{Cli, Diagnostic, Report, Severity};
use std::path::PathBuf;

/// ASCII art banner displayed at startup.
const BANNER: &str = r#"
  ___                          ____             _   _            _
 / _ \ _   _  ___ _ __ _   _  / ___|  ___ _ __ | |_(_)_ __   ___| |
| | | | | | |/ _ \ '__| | | | \___ \ / _ \ '_ \| __| | '_ \ / _ \ |
| |_| | |_| |  __/ |  | |_| |  ___) |  __/ | | | |_| | | | |  __/ |
 \__\_\\__,_|\___|_|   \__, | |____/ \___|_| |_|\__|_|_| |_|\___|_|
                       |___/
            SQL Injection Trust Analyzer for Query Builders
"#;

/// Application entry point.
///
/// Initializes the logging system, displays the banner, parses command-line
/// arguments, and dispatches to the appropriate command handler.
///
/// # Returns
///
/// Returns `Ok(())` on successful execution, or an error if any operation fails.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("{}", BANNER.cyan().bold());

    let cli = Cli::parse();

    match cli.command {
        query_sentinel::cli::Commands::Analyze {
            path,
            policy_roots,
            format,
            output,
            severity,
            this_only,
            strict_index,
        } => {
            run_analyze(
                path,
                policy_roots,
                format,
                output,
                severity,
                this_only,
                strict_index,
            )?;
        }
        query_sentinel::cli::Commands::Policy { policy_roots } => {
            run_policy(policy_roots)?;
        }
        query_sentinel::cli::Commands::Version => {
            println!(
                "{} {}",
                "Query-Sentinel version:".green(),
                env!("CARGO_PKG_VERSION").yellow()
            );
        }
    }

    Ok(())
}

/// Executes the analyze operation.
///
/// This function orchestrates the complete analysis workflow:
/// 1. Discovers and merges trust policy files under the policy roots
/// 2. Collects node-stream files from the specified path
/// 3. Runs the flow driver over every stream
/// 4. Generates reports in the specified format
///
/// Exits with status 1 when any diagnostic of severity High or above
/// remains after filtering, so CI jobs fail on real findings.
///
/// # Arguments
///
/// * `path` - The node-stream file or directory to analyze
/// * `policy_roots` - Directories searched for policy files
/// * `format` - Output format: "terminal", "json", or "markdown"
/// * `output` - Optional output file for the report
/// * `min_severity` - Optional minimum severity level to include in results
/// * `this_only` - Only vet calls on the current object
/// * `strict_index` - Also classify array index expressions
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if analysis fails.
fn run_analyze(
    path: PathBuf,
    policy_roots: Vec<PathBuf>,
    format: String,
    output: Option<PathBuf>,
    min_severity: Option<String>,
    this_only: bool,
    strict_index: bool,
) -> Result<()> {
    println!(
        "{} {}",
        "[*] Analyzing:".green().bold(),
        path.display().to_string().yellow()
    );

    let loader = PolicyLoader::new(policy_roots);
    let (policy, sources) = loader.load_with_sources()?;
    if sources.is_empty() {
        println!("{}", "[*] No policy files found; using built-ins only".dimmed());
    } else {
        for source in &sources {
            println!(
                "{} {}",
                "[*] Policy:".green(),
                source.display().to_string().yellow()
            );
        }
    }

    let options = AnalyzerOptions {
        check_this_only: this_only,
        strict_index,
    };

    let (all_diags, files_analyzed) = perform_analysis(&path, &policy, options)?;

    let diagnostics: Vec<Diagnostic> = if let Some(ref min_sev) = min_severity {
        let min = Severity::parse(min_sev);
        all_diags.into_iter().filter(|d| d.severity >= min).collect()
    } else {
        all_diags
    };

    let report = Report::new(diagnostics, path, files_analyzed);

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report)?;
            write_or_print(&json, output)?;
        }
        "markdown" => {
            let md = report.to_markdown();
            write_or_print(&md, output)?;
        }
        _ => {
            report.print_terminal();
        }
    }

    println!("\n{}", "=".repeat(60).cyan());
    report.print_summary();

    if report.has_at_least(Severity::High) {
        std::process::exit(1);
    }

    Ok(())
}

fn write_or_print(content: &str, output: Option<PathBuf>) -> Result<()> {
    if let Some(out_path) = output {
        std::fs::write(&out_path, content)?;
        println!(
            "{} {}",
            "[+] Report saved to:".green(),
            out_path.display().to_string().yellow()
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Runs the flow driver over every node-stream file under `path`.
///
/// Streams are analyzed in path order with a shared trust policy; each
/// stream gets a fresh analyzer, matching the per-file trust scope.
fn perform_analysis(
    path: &PathBuf,
    policy: &query_sentinel::TrustPolicy,
    options: AnalyzerOptions,
) -> Result<(Vec<Diagnostic>, usize)> {
    use indicatif::{ProgressBar, ProgressStyle};

    let files = if path.is_file() {
        vec![path.clone()]
    } else {
        collect_stream_files(path)?
    };

    if files.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut all_diags = Vec::new();
    let mut analyzed = 0usize;

    for file_path in &files {
        pb.set_message(format!(
            "Analyzing {}",
            file_path.file_name().unwrap_or_default().to_string_lossy()
        ));

        match NodeStream::from_path(file_path) {
            Ok(stream) => {
                let analyzer = Analyzer::new(policy, options);
                all_diags.extend(analyzer.analyze_stream(&stream));
                analyzed += 1;
            }
            Err(e) => {
                log::warn!("failed to load {}: {}", file_path.display(), e);
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok((all_diags, analyzed))
}

/// Collects node-stream files from a directory.
///
/// Traverses the specified directory and collects all `.json` files,
/// skipping policy files.
fn collect_stream_files(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    use query_sentinel::policy::POLICY_FILE_NAME;
    use walkdir::WalkDir;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().map_or(false, |ext| ext == "json")
                && e.file_name().to_string_lossy() != POLICY_FILE_NAME
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    Ok(files)
}

/// Displays the effective merged trust policy.
///
/// Prints the contributing policy files in merge order and the per-table
/// entry counts of the merged result.
fn run_policy(policy_roots: Vec<PathBuf>) -> Result<()> {
    let loader = PolicyLoader::new(policy_roots);
    let (policy, sources) = loader.load_with_sources()?;

    println!("{}", "[*] Effective Trust Policy:".green().bold());
    println!("{}", "-".repeat(60).cyan());

    if sources.is_empty() {
        println!("  {}", "built-ins only (no policy files found)".dimmed());
    } else {
        for source in &sources {
            println!("  {} {}", "merged".cyan(), source.display());
        }
    }

    println!();
    for (table, count) in policy.table_sizes() {
        println!("  {:<30} {}", table.white(), count.to_string().yellow());
    }

    Ok(())
}
