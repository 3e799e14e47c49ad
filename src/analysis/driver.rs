//! # Flow Driver
//!
//! @title Per-Node Analysis Driver
//! @author Ramprasad
//!
//! Consumes a node stream in host traversal order and routes each operation:
//! assignments update the trust state, statement-level instance calls are
//! vetted and reported, statement-level static calls only fire their clearing
//! side effects. Crossing into a new file evicts the previous file's trust
//! entries, keeping memory bounded over large scans.

use log::debug;

use crate::ir::{AssignTarget, ExprKind, FlowNode, FlowOp, NodeStream};
use crate::policy::TrustPolicy;
use crate::report::Diagnostic;

use super::call_site::receiver_is_this;
use super::classifier::{AnalyzerOptions, Classifier, Scope};
use super::state::TrustState;

/// Stateful analyzer over one node stream.
///
/// Owns the per-run trust state; the policy is borrowed so one loaded policy
/// can serve many analyzers.
pub struct Analyzer<'p> {
    classifier: Classifier<'p>,
    options: AnalyzerOptions,
    state: TrustState,
    current_file: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'p> Analyzer<'p> {
    /// Creates an analyzer with empty trust state.
    pub fn new(policy: &'p TrustPolicy, options: AnalyzerOptions) -> Self {
        Self {
            classifier: Classifier::new(policy, options),
            options,
            state: TrustState::new(),
            current_file: None,
            diagnostics: Vec::new(),
        }
    }

    /// Runs the full stream and returns the collected diagnostics.
    pub fn analyze_stream(mut self, stream: &NodeStream) -> Vec<Diagnostic> {
        for node in &stream.nodes {
            self.visit(node);
        }
        self.diagnostics
    }

    /// Routes one traversal node.
    pub fn visit(&mut self, node: &FlowNode) {
        self.track_file(&node.file);

        let scope = Scope {
            file: &node.file,
            class: &node.class,
            function: &node.function,
        };

        match &node.op {
            FlowOp::Assign { target, value } => {
                let mut side_diags = Vec::new();
                let unsafe_value =
                    self.classifier
                        .is_unsafe(value, &scope, &mut self.state, &mut side_diags);
                self.diagnostics.extend(side_diags);

                match target {
                    AssignTarget::Var { name } => {
                        self.state
                            .set(&node.file, &node.function, name, !unsafe_value);
                    }
                    AssignTarget::List { names } => {
                        for name in names {
                            self.state
                                .set(&node.file, &node.function, name, !unsafe_value);
                        }
                    }
                }
            }

            FlowOp::MethodCall { call } => {
                let ExprKind::MethodCall {
                    receiver,
                    method,
                    args,
                } = &call.kind
                else {
                    debug!("skipping malformed method_call node in {}", node.file);
                    return;
                };

                if self.options.check_this_only && !receiver_is_this(receiver) {
                    return;
                }

                let mut diags = Vec::new();
                self.classifier.eval_method_call(
                    call,
                    receiver,
                    method,
                    args,
                    &scope,
                    &mut self.state,
                    &mut diags,
                    true,
                );
                self.diagnostics.extend(diags);
            }

            FlowOp::StaticCall { call } => {
                let ExprKind::StaticCall {
                    class,
                    method,
                    args,
                } = &call.kind
                else {
                    debug!("skipping malformed static_call node in {}", node.file);
                    return;
                };

                // Statement-level static calls contribute clearing effects
                // only; their verdict and any nested notes are discarded.
                let mut discard = Vec::new();
                let _ = self.classifier.is_unsafe_static_call(
                    class,
                    method,
                    args,
                    &scope,
                    &mut self.state,
                    &mut discard,
                );
            }
        }
    }

    fn track_file(&mut self, file: &str) {
        if self.current_file.as_deref() != Some(file) {
            if let Some(previous) = self.current_file.take() {
                self.state.evict_file(&previous);
            }
            self.current_file = Some(file.to_string());
        }
    }
}
