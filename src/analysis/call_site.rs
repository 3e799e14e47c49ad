//! # Call-Site Evaluation
//!
//! @title Method Call Vetting
//! @author Ramprasad
//!
//! Specializes the classifier for instance and static method calls: applies
//! the whitelist and argument-position tables of the trust policy, emits
//! diagnostics for vetted calls with tainted arguments, fires clearing-method
//! side effects and propagates distrust to the call's root receiver variable.

use crate::ir::{render_expr, ClassRef, Expr, ExprKind, StaticType};
use crate::policy::ArgSpec;
use crate::report::{Diagnostic, DiagnosticKind, Severity};

use super::classifier::{Classifier, Scope, ENTITY_REPOSITORY};
use super::state::TrustState;

/// Entity-name accessor on ORM repositories; its result is a class name
/// controlled by the application, never by request input.
const GET_ENTITY_NAME: &str = "getEntityName";

impl<'p> Classifier<'p> {
    /// Evaluates an instance method call `recv->method(args)`.
    ///
    /// `call` is the whole call expression, carrying the host's inferred
    /// result type. With `report` set, every tainted argument of a
    /// diagnostic-vetted method produces an [`DiagnosticKind::UnsafeArgument`]
    /// entry; nested evaluation passes `report = false` and only the verdict
    /// escapes.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn eval_method_call(
        &self,
        call: &Expr,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        scope: &Scope<'_>,
        state: &mut TrustState,
        diags: &mut Vec<Diagnostic>,
        report: bool,
    ) -> bool {
        // A numeric or boolean result cannot carry an injectable string.
        if call.static_type().is_non_string_scalar() {
            return false;
        }

        let Some(receiver_ty) = resolve_receiver(receiver) else {
            if self.policy().watch_listed(method) {
                diags.push(Diagnostic {
                    kind: DiagnosticKind::UnresolvedReceiver,
                    severity: Severity::Info,
                    class: String::new(),
                    method: method.to_string(),
                    argument: None,
                    source: render_expr(receiver),
                    context_class: scope.class.to_string(),
                    context_function: scope.function.to_string(),
                    file: scope.file.to_string(),
                });
            }
            return true;
        };

        let class = receiver_class_name(receiver_ty);

        // Sanitizer side effect, independent of the verdict below.
        if self.policy().is_clear_method(class, method) {
            clear_first_argument(args, scope, state);
        }

        if method.eq_ignore_ascii_case(GET_ENTITY_NAME)
            && receiver_ty.is_a(ENTITY_REPOSITORY)
        {
            return false;
        }

        if self.policy().is_safe_method(class, method) {
            return false;
        }

        if let Some(spec) = self.policy().check_method_safety(class, method) {
            return self.any_position_unsafe(spec, args, scope, state, diags);
        }

        if let Some(spec) = self.policy().check_method(class, method) {
            let mut tainted = false;
            for position in spec.positions(args.len()) {
                if self.is_unsafe(&args[position], scope, state, diags) {
                    tainted = true;
                    if report {
                        diags.push(Diagnostic {
                            kind: DiagnosticKind::UnsafeArgument,
                            severity: Severity::High,
                            class: class.to_string(),
                            method: method.to_string(),
                            argument: Some(position),
                            source: render_expr(&args[position]),
                            context_class: scope.class.to_string(),
                            context_function: scope.function.to_string(),
                            file: scope.file.to_string(),
                        });
                    }
                }
            }
            if tainted {
                // An unsafe mutation was applied to the receiver; whatever
                // variable it bottoms out in must not stay trusted.
                if let Some(root) = root_receiver_var(receiver) {
                    state.revoke(scope.file, scope.function, root);
                }
            }
            return tainted;
        }

        // Never vetted by any table.
        true
    }

    /// Evaluates a static call `Class::method(args)`.
    ///
    /// Static calls never emit argument diagnostics; they contribute a bare
    /// verdict, plus the clearing side effect.
    pub(crate) fn is_unsafe_static_call(
        &self,
        class_ref: &ClassRef,
        method: &str,
        args: &[Expr],
        scope: &Scope<'_>,
        state: &mut TrustState,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        let class = match class_ref {
            ClassRef::Name(name) => name.as_str(),
            ClassRef::SelfClass => scope.class,
            // A class reference held in a variable cannot be vetted.
            ClassRef::Dynamic => return true,
        };

        if self.policy().is_clear_static_method(class, method) {
            clear_first_argument(args, scope, state);
        }

        if self.policy().is_safe_static_method(class, method) {
            return false;
        }

        if let Some(spec) = self.policy().check_static_method_safety(class, method) {
            return self.any_position_unsafe(spec, args, scope, state, diags);
        }

        true
    }

    fn any_position_unsafe(
        &self,
        spec: &ArgSpec,
        args: &[Expr],
        scope: &Scope<'_>,
        state: &mut TrustState,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        spec.positions(args.len())
            .into_iter()
            .any(|position| self.is_unsafe(&args[position], scope, state, diags))
    }
}

/// Whether a statement-level call targets the current object.
pub(crate) fn receiver_is_this(receiver: &Expr) -> bool {
    if let Some(StaticType::Object { is_this, .. }) = receiver.static_type().object_class() {
        if *is_this {
            return true;
        }
    }
    matches!(&receiver.kind, ExprKind::Var { name } if name == "this")
}

/// Resolves a receiver expression to an object type, looking through unions.
fn resolve_receiver(receiver: &Expr) -> Option<&StaticType> {
    receiver.static_type().object_class()
}

fn receiver_class_name(ty: &StaticType) -> &str {
    match ty {
        StaticType::Object { class, .. } => class.as_str(),
        _ => "",
    }
}

/// Marks the first argument's variable trusted, modelling a sanitizer.
fn clear_first_argument(args: &[Expr], scope: &Scope<'_>, state: &mut TrustState) {
    if let Some(Expr {
        kind: ExprKind::Var { name },
        ..
    }) = args.first()
    {
        state.set(scope.file, scope.function, name, true);
    }
}

/// Unwraps a chain of method calls to the innermost bare variable.
///
/// Iterative on purpose: receiver chains in generated query-builder code can
/// be arbitrarily deep.
fn root_receiver_var(receiver: &Expr) -> Option<&str> {
    let mut current = receiver;
    loop {
        match &current.kind {
            ExprKind::Var { name } => return Some(name),
            ExprKind::MethodCall { receiver, .. } => current = receiver,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::AnalyzerOptions;
    use crate::ir::{ExprKind, StaticType};
    use crate::policy::{PolicyFile, TrustPolicy};

    fn policy(json: &str) -> TrustPolicy {
        let mut policy = TrustPolicy::builtin();
        let file: PolicyFile = serde_json::from_str(json).unwrap();
        policy.merge(file);
        policy
    }

    fn scope() -> Scope<'static> {
        Scope {
            file: "repo.php",
            class: "UserRepository",
            function: "search",
        }
    }

    fn var(name: &str) -> Expr {
        Expr::new(ExprKind::Var { name: name.into() })
    }

    fn lit(value: &str) -> Expr {
        Expr::new(ExprKind::StringLit {
            value: value.into(),
        })
    }

    fn qb_type() -> StaticType {
        StaticType::Object {
            class: "QueryBuilder".into(),
            is_this: false,
            parents: vec![],
        }
    }

    fn call(receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        })
    }

    fn eval(
        policy: &TrustPolicy,
        state: &mut TrustState,
        expr: &Expr,
        report: bool,
    ) -> (bool, Vec<Diagnostic>) {
        let classifier = Classifier::new(policy, AnalyzerOptions::default());
        let mut diags = Vec::new();
        let ExprKind::MethodCall {
            receiver,
            method,
            args,
        } = &expr.kind
        else {
            panic!("expected a method call expression");
        };
        let verdict = classifier.eval_method_call(
            expr,
            receiver,
            method,
            args,
            &scope(),
            state,
            &mut diags,
            report,
        );
        (verdict, diags)
    }

    #[test]
    fn test_unvetted_call_is_unsafe_without_diagnostics() {
        let policy = TrustPolicy::builtin();
        let mut state = TrustState::new();
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "mystery",
            vec![lit("x")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_safe_method_is_safe_regardless_of_arguments() {
        let policy = policy(r#"{"safe_methods": {"QueryBuilder": ["getQuery"]}}"#);
        let mut state = TrustState::new();
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "getQuery",
            vec![var("tainted")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(!verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_check_method_reports_each_tainted_position() {
        let policy = policy(r#"{"check_methods": {"QueryBuilder": {"where": true}}}"#);
        let mut state = TrustState::new();
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "where",
            vec![var("a"), lit("b"), var("c")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(verdict);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].argument, Some(0));
        assert_eq!(diags[1].argument, Some(2));
        assert_eq!(diags[0].class, "QueryBuilder");
        assert_eq!(diags[0].severity, Severity::High);
        assert_eq!(diags[0].source, "$a");
    }

    #[test]
    fn test_nested_evaluation_suppresses_argument_diagnostics() {
        let policy = policy(r#"{"check_methods": {"QueryBuilder": {"where": true}}}"#);
        let mut state = TrustState::new();
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "where",
            vec![var("a")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, false);
        assert!(verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_check_method_positions_limit_vetting() {
        let policy = policy(r#"{"check_methods": {"QueryBuilder": {"setParameter": [1]}}}"#);
        let mut state = TrustState::new();
        // Position 0 tainted but unvetted; position 1 safe.
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "setParameter",
            vec![var("name"), lit("value")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(!verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_check_method_safety_wins_over_check_methods() {
        let policy = policy(
            r#"{
                "check_methods_safety": {"QueryBuilder": {"expr": true}},
                "check_methods": {"QueryBuilder": {"expr": true}}
            }"#,
        );
        let mut state = TrustState::new();
        let expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "expr",
            vec![var("a")],
        );
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(verdict);
        // The safety table is verdict-only even at statement level.
        assert!(diags.is_empty());
    }

    #[test]
    fn test_scalar_result_type_short_circuits() {
        let policy = TrustPolicy::builtin();
        let mut state = TrustState::new();
        let mut expr = call(
            Expr::typed(ExprKind::Var { name: "qb".into() }, qb_type()),
            "count",
            vec![var("tainted")],
        );
        expr.ty = Some(StaticType::Int);
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(!verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_receiver_default_denies_with_watch_list_note() {
        let policy = policy(r#"{"check_methods": {"QueryBuilder": {"where": true}}}"#);
        let mut state = TrustState::new();

        // Watch-listed method on an untyped receiver: unsafe plus a note.
        let expr = call(var("qb"), "where", vec![lit("1 = 1")]);
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(verdict);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedReceiver);
        assert_eq!(diags[0].severity, Severity::Info);

        // Unlisted method: unsafe, silently.
        let expr = call(var("qb"), "obscure", vec![]);
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_entity_name_accessor_on_repository() {
        let policy = TrustPolicy::builtin();
        let mut state = TrustState::new();
        let repo = Expr::typed(
            ExprKind::Var { name: "repo".into() },
            StaticType::Object {
                class: "UserRepository".into(),
                is_this: false,
                parents: vec![ENTITY_REPOSITORY.into()],
            },
        );
        let expr = call(repo, "getEntityName", vec![]);
        let (verdict, diags) = eval(&policy, &mut state, &expr, true);
        assert!(!verdict);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_clearing_method_marks_first_argument_trusted() {
        let policy = policy(r#"{"clear_methods": {"Sanitizer": ["clean"]}}"#);
        let mut state = TrustState::new();
        let sanitizer = Expr::typed(
            ExprKind::Var { name: "san".into() },
            StaticType::Object {
                class: "Sanitizer".into(),
                is_this: false,
                parents: vec![],
            },
        );
        let expr = call(sanitizer, "clean", vec![var("input")]);
        let _ = eval(&policy, &mut state, &expr, true);
        assert!(state.is_trusted("repo.php", "search", "input"));
    }

    #[test]
    fn test_distrust_propagates_to_root_receiver() {
        let policy = policy(r#"{"check_methods": {"QueryBuilder": {"where": true}}}"#);
        let mut state = TrustState::new();
        state.set("repo.php", "search", "qb", true);

        // $qb->select()->where($tainted) leaves $qb untrusted.
        let inner = Expr::typed(
            ExprKind::MethodCall {
                receiver: Box::new(Expr::typed(
                    ExprKind::Var { name: "qb".into() },
                    qb_type(),
                )),
                method: "select".into(),
                args: vec![],
            },
            qb_type(),
        );
        let chained = call(inner, "where", vec![var("evil")]);
        let (verdict, _) = eval(&policy, &mut state, &chained, true);
        assert!(verdict);
        assert!(!state.is_trusted("repo.php", "search", "qb"));
    }

    #[test]
    fn test_static_call_vetting() {
        let policy = policy(
            r#"{
                "safe_static_methods": {"Helper": ["table"]},
                "check_static_methods_safety": {"Expr": {"andX": true}},
                "clear_static_methods": {"Sanitizer": ["clean"]}
            }"#,
        );
        let classifier = Classifier::new(&policy, AnalyzerOptions::default());
        let mut state = TrustState::new();
        let mut diags = Vec::new();
        let sc = scope();

        assert!(!classifier.is_unsafe_static_call(
            &ClassRef::Name("Helper".into()),
            "table",
            &[var("anything")],
            &sc,
            &mut state,
            &mut diags,
        ));

        assert!(classifier.is_unsafe_static_call(
            &ClassRef::Name("Expr".into()),
            "andX",
            &[var("tainted")],
            &sc,
            &mut state,
            &mut diags,
        ));
        assert!(!classifier.is_unsafe_static_call(
            &ClassRef::Name("Expr".into()),
            "andX",
            &[lit("u.id = 1")],
            &sc,
            &mut state,
            &mut diags,
        ));

        // Dynamic class references cannot be resolved against the policy.
        assert!(classifier.is_unsafe_static_call(
            &ClassRef::Dynamic,
            "table",
            &[],
            &sc,
            &mut state,
            &mut diags,
        ));

        classifier.is_unsafe_static_call(
            &ClassRef::Name("Sanitizer".into()),
            "clean",
            &[var("raw")],
            &sc,
            &mut state,
            &mut diags,
        );
        assert!(state.is_trusted("repo.php", "search", "raw"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_self_class_resolution() {
        let policy = policy(r#"{"safe_static_methods": {"UserRepository": ["alias"]}}"#);
        let classifier = Classifier::new(&policy, AnalyzerOptions::default());
        let mut state = TrustState::new();
        let mut diags = Vec::new();

        assert!(!classifier.is_unsafe_static_call(
            &ClassRef::SelfClass,
            "alias",
            &[],
            &scope(),
            &mut state,
            &mut diags,
        ));
    }

    #[test]
    fn test_receiver_is_this() {
        assert!(receiver_is_this(&var("this")));
        assert!(!receiver_is_this(&var("qb")));
        assert!(receiver_is_this(&Expr::typed(
            ExprKind::Var { name: "self".into() },
            StaticType::Object {
                class: "UserRepository".into(),
                is_this: true,
                parents: vec![],
            },
        )));
    }
}
