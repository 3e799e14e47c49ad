//! # Query-Sentinel Library
//!
//! @title Query-Sentinel - SQL Injection Trust Analyzer
//! @author Ramprasad
//!
//! A policy-driven taint classifier for query-builder call sites.
//!
//! This library decides, for every value reaching a vetted method-call
//! argument, whether it could carry attacker-influenced string content. The
//! classifier is default-deny: only constructions a configurable trust policy
//! can prove safe are accepted.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions and argument parsing
//! - [`ir`] - Language-independent expression tree and flow node model
//! - [`policy`] - Trust policy tables, discovery and merging
//! - [`analysis`] - Classifier, call-site vetting, trust state, flow driver
//! - [`report`] - Diagnostic collection and report rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use query_sentinel::analysis::{Analyzer, AnalyzerOptions};
//! use query_sentinel::ir::NodeStream;
//! use query_sentinel::policy::PolicyLoader;
//!
//! let policy = PolicyLoader::new(vec![config_dir]).load()?;
//! let stream = NodeStream::from_path(Path::new("./nodes.json"))?;
//! let diags = Analyzer::new(&policy, AnalyzerOptions::default()).analyze_stream(&stream);
//! ```

pub mod analysis;
pub mod cli;
pub mod ir;
pub mod policy;
pub mod report;

pub use analysis::{Analyzer, AnalyzerOptions};
pub use cli::Cli;
pub use policy::{PolicyLoader, TrustPolicy};
pub use report::{Diagnostic, Report, Severity};
