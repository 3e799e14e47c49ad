//! # Expression Renderer
//!
//! Renders expression trees back to a compact source-like text used in
//! diagnostic messages, so an unsafe argument can be shown to the developer
//! without shipping original source spans through the pipeline.

use super::expr::{ArrayItem, Callee, CastKind, ClassRef, Expr, ExprKind};

/// Renders an expression to source-like text.
pub fn render_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::StringLit { value } => format!("'{}'", value.replace('\'', "\\'")),
        ExprKind::IntLit { value } => value.to_string(),
        ExprKind::FloatLit { value } => value.to_string(),
        ExprKind::BoolLit { value } => value.to_string(),
        ExprKind::Var { name } => format!("${}", name),
        ExprKind::PropertyFetch { object, property } => {
            format!("{}->{}", render_expr(object), property)
        }
        ExprKind::ArrayLit { items } => {
            let rendered: Vec<String> = items.iter().map(render_item).collect();
            format!("[{}]", rendered.join(", "))
        }
        ExprKind::Index { base, index } => {
            format!("{}[{}]", render_expr(base), render_expr(index))
        }
        ExprKind::Concat { left, right } => {
            format!("{} . {}", render_expr(left), render_expr(right))
        }
        ExprKind::Ternary {
            condition,
            then,
            otherwise,
        } => match then {
            Some(then) => format!(
                "{} ? {} : {}",
                render_expr(condition),
                render_expr(then),
                render_expr(otherwise)
            ),
            None => format!("{} ?: {}", render_expr(condition), render_expr(otherwise)),
        },
        ExprKind::Interpolated { parts } => {
            let mut out = String::from("\"");
            for part in parts {
                match &part.kind {
                    ExprKind::StringLit { value } => out.push_str(value),
                    _ => {
                        out.push('{');
                        out.push_str(&render_expr(part));
                        out.push('}');
                    }
                }
            }
            out.push('"');
            out
        }
        ExprKind::Cast { cast, expr } => format!("({}) {}", cast_name(*cast), render_expr(expr)),
        ExprKind::FuncCall { callee, args } => {
            let name = match callee {
                Callee::Name(name) => name.clone(),
                Callee::Dynamic => "<dynamic>".to_string(),
            };
            format!("{}({})", name, render_args(args))
        }
        ExprKind::StaticCall {
            class,
            method,
            args,
        } => {
            let class = match class {
                ClassRef::Name(name) => name.as_str(),
                ClassRef::SelfClass => "self",
                ClassRef::Dynamic => "<dynamic>",
            };
            format!("{}::{}({})", class, method, render_args(args))
        }
        ExprKind::MethodCall {
            receiver,
            method,
            args,
        } => format!("{}->{}({})", render_expr(receiver), method, render_args(args)),
        ExprKind::Opaque => "<expr>".to_string(),
    }
}

fn render_item(item: &ArrayItem) -> String {
    match &item.key {
        Some(key) => format!("{} => {}", render_expr(key), render_expr(&item.value)),
        None => render_expr(&item.value),
    }
}

fn render_args(args: &[Expr]) -> String {
    let rendered: Vec<String> = args.iter().map(render_expr).collect();
    rendered.join(", ")
}

fn cast_name(kind: CastKind) -> &'static str {
    match kind {
        CastKind::Int => "int",
        CastKind::Bool => "bool",
        CastKind::Float => "float",
        CastKind::Str => "string",
        CastKind::Array => "array",
        CastKind::Object => "object",
        CastKind::Other => "unset",
    }
}
