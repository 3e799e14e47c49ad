//! # Analysis Module
//!
//! @title Taint Classification Engine
//! @author Ramprasad
//!
//! The analysis core: a default-deny recursive classifier over the
//! expression tree, specialized call-site vetting against the trust policy,
//! per-call-site trust state, and the flow driver that stitches them
//! together over a node stream.
//!
//! ## Components
//!
//! - **Classifier**: recursive taint predicate over expressions
//! - **Call-Site Evaluation**: whitelist/argument-position vetting of calls
//! - **Trust State**: per-file, per-function variable trust tracking
//! - **Flow Driver**: per-node dispatch in host traversal order

pub mod call_site;
pub mod classifier;
pub mod driver;
pub mod state;

pub use classifier::{AnalyzerOptions, Classifier, Scope};
pub use driver::Analyzer;
pub use state::TrustState;
