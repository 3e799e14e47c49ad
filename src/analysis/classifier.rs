//! # Expression Classifier
//!
//! @title Recursive Taint Classifier
//! @author Ramprasad
//!
//! The core decision procedure: for a value-producing expression, decide
//! whether it could carry attacker-influenced string content capable of
//! corrupting a generated query.
//!
//! The classifier is a depth-first recursive predicate with one arm per
//! expression kind and a default-deny arm; exhaustiveness over the closed
//! [`ExprKind`] set is enforced by the compiler. It favors false positives
//! over false negatives: anything it cannot prove safe is unsafe.

use crate::ir::{Expr, ExprKind};
use crate::policy::TrustPolicy;
use crate::report::Diagnostic;

use super::state::TrustState;

/// Class whose repositories get the hard-coded entity-name exceptions.
pub(crate) const ENTITY_REPOSITORY: &str = "Doctrine\\ORM\\EntityRepository";

/// Repository property holding the managed entity name; always safe.
const ENTITY_NAME_PROPERTY: &str = "_entityName";

/// Lexical context of the expression being classified, as supplied by the
/// host traversal.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Current file identifier.
    pub file: &'a str,

    /// Enclosing class name, empty outside a class.
    pub class: &'a str,

    /// Enclosing function name, empty at top level.
    pub function: &'a str,
}

/// Tunables shared by the classifier and the flow driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerOptions {
    /// Only evaluate statement-level calls whose receiver is the current
    /// object (`$this`).
    pub check_this_only: bool,

    /// Also check the index expression of array element accesses. Off by
    /// default: the base expression is treated as the sole taint carrier.
    pub strict_index: bool,
}

/// Policy-driven expression classifier.
///
/// Stateless beyond [`TrustState`] lookups; one instance serves a whole run.
pub struct Classifier<'p> {
    policy: &'p TrustPolicy,
    options: AnalyzerOptions,
}

impl<'p> Classifier<'p> {
    /// Creates a classifier over an immutable policy.
    pub fn new(policy: &'p TrustPolicy, options: AnalyzerOptions) -> Self {
        Self { policy, options }
    }

    pub(crate) fn policy(&self) -> &'p TrustPolicy {
        self.policy
    }

    /// Decides whether `expr` may carry tainted string content.
    ///
    /// `state` is consulted for variable trust and mutated by clearing
    /// methods and distrust propagation encountered in nested calls. `diags`
    /// receives informational diagnostics (unresolved receivers of
    /// watch-listed methods); argument diagnostics are only produced by the
    /// statement-level call evaluation in the flow driver.
    pub fn is_unsafe(
        &self,
        expr: &Expr,
        scope: &Scope<'_>,
        state: &mut TrustState,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        match &expr.kind {
            // Literals carry no attacker influence.
            ExprKind::StringLit { .. }
            | ExprKind::IntLit { .. }
            | ExprKind::FloatLit { .. }
            | ExprKind::BoolLit { .. } => false,

            ExprKind::Var { name } => {
                !(self
                    .policy
                    .variable_trusted(scope.class, scope.function, name)
                    || state.is_trusted(scope.file, scope.function, name))
            }

            ExprKind::PropertyFetch { object, property } => {
                self.is_unsafe_property(object, property, scope)
            }

            ExprKind::Concat { left, right } => {
                self.is_unsafe(left, scope, state, diags)
                    || self.is_unsafe(right, scope, state, diags)
            }

            ExprKind::Interpolated { parts } => parts
                .iter()
                .any(|part| self.is_unsafe(part, scope, state, diags)),

            ExprKind::ArrayLit { items } => items.iter().any(|item| {
                item.key
                    .as_ref()
                    .map_or(false, |key| self.is_unsafe(key, scope, state, diags))
                    || self.is_unsafe(&item.value, scope, state, diags)
            }),

            ExprKind::Index { base, index } => {
                self.is_unsafe(base, scope, state, diags)
                    || (self.options.strict_index && self.is_unsafe(index, scope, state, diags))
            }

            // The condition is not load-bearing for injection risk.
            ExprKind::Ternary {
                condition: _,
                then,
                otherwise,
            } => {
                then.as_ref()
                    .map_or(false, |t| self.is_unsafe(t, scope, state, diags))
                    || self.is_unsafe(otherwise, scope, state, diags)
            }

            ExprKind::Cast { cast, expr } => {
                if cast.is_narrowing() {
                    false
                } else {
                    self.is_unsafe(expr, scope, state, diags)
                }
            }

            ExprKind::FuncCall { callee, args } => {
                self.is_unsafe_function_call(callee, args, scope, state, diags)
            }

            ExprKind::StaticCall {
                class,
                method,
                args,
            } => self.is_unsafe_static_call(class, method, args, scope, state, diags),

            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.eval_method_call(expr, receiver, method, args, scope, state, diags, false),

            // Default deny: anything outside the decidable set.
            ExprKind::Opaque => true,
        }
    }

    /// A property is safe when whitelisted for its declaring scope, or when
    /// it is the entity-name field of an ORM repository. Receivers the host
    /// could not type are unsafe.
    fn is_unsafe_property(&self, object: &Expr, property: &str, scope: &Scope<'_>) -> bool {
        let Some(receiver) = object.static_type().object_class() else {
            return true;
        };

        if property == ENTITY_NAME_PROPERTY && receiver.is_a(ENTITY_REPOSITORY) {
            return false;
        }

        let class = match receiver {
            crate::ir::StaticType::Object { class, .. } => class.as_str(),
            _ => return true,
        };

        !self.policy.property_trusted(class, scope.function, property)
    }

    /// A function call is safe only for a statically known, whitelisted
    /// combinator with all-safe arguments. Dynamic callees are unsafe.
    fn is_unsafe_function_call(
        &self,
        callee: &crate::ir::Callee,
        args: &[Expr],
        scope: &Scope<'_>,
        state: &mut TrustState,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        match callee {
            crate::ir::Callee::Name(name) if self.policy.is_safe_function(name) => args
                .iter()
                .any(|arg| self.is_unsafe(arg, scope, state, diags)),
            _ => true,
        }
    }
}
