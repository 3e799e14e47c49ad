//! # Expression Tree Definitions
//!
//! @title Closed Expression Tagged Union
//! @author Ramprasad
//!
//! Defines the expression node kinds the classifier can decide on. The set is
//! deliberately closed: every kind the classifier does not recognize must be
//! emitted by the host as [`ExprKind::Opaque`], which the classifier treats
//! as unsafe. Exhaustiveness of the decision procedure is enforced by the
//! compiler through `match` over [`ExprKind`].

use serde::{Deserialize, Serialize};

/// An expression node, optionally annotated with its host-inferred type.
///
/// The type annotation is the host analyzer's best effort. A missing
/// annotation means the host could not (or did not bother to) resolve the
/// type; the classifier fails closed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    /// Host-inferred static type of this expression, if resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<StaticType>,

    /// The expression kind with its children.
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl Expr {
    /// Builds an untyped expression from a kind.
    pub fn new(kind: ExprKind) -> Self {
        Self { ty: None, kind }
    }

    /// Builds an expression carrying a host type annotation.
    pub fn typed(kind: ExprKind, ty: StaticType) -> Self {
        Self { ty: Some(ty), kind }
    }

    /// Returns the host-inferred type, [`StaticType::Unknown`] if absent.
    pub fn static_type(&self) -> &StaticType {
        self.ty.as_ref().unwrap_or(&StaticType::Unknown)
    }
}

/// The closed set of value-producing expression kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ExprKind {
    /// String literal.
    StringLit { value: String },

    /// Integer literal.
    IntLit { value: i64 },

    /// Floating-point literal.
    FloatLit { value: f64 },

    /// Boolean literal.
    BoolLit { value: bool },

    /// Local variable reference.
    Var { name: String },

    /// Property fetch on an object expression.
    PropertyFetch { object: Box<Expr>, property: String },

    /// Array literal with optional keys.
    ArrayLit { items: Vec<ArrayItem> },

    /// Array element access.
    Index { base: Box<Expr>, index: Box<Expr> },

    /// String concatenation.
    Concat { left: Box<Expr>, right: Box<Expr> },

    /// Ternary conditional. `then` is absent for the short form `c ?: e`,
    /// where the condition doubles as the taken value.
    Ternary {
        condition: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },

    /// Interpolated ("encapsed") string built from parts.
    Interpolated { parts: Vec<Expr> },

    /// Type cast applied to an inner expression.
    Cast { cast: CastKind, expr: Box<Expr> },

    /// Free function call.
    FuncCall { callee: Callee, args: Vec<Expr> },

    /// Static method call.
    StaticCall {
        class: ClassRef,
        method: String,
        args: Vec<Expr>,
    },

    /// Instance method call.
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Any construct outside the decidable set. Always unsafe.
    Opaque,
}

/// One element of an array literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayItem {
    /// Explicit key expression, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Expr>,

    /// Element value expression.
    pub value: Expr,
}

/// Cast target kinds. Only the definite non-string scalar casts narrow away
/// injection surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    Int,
    Bool,
    Float,
    Str,
    Array,
    Object,
    Other,
}

impl CastKind {
    /// Whether the cast result can never carry an injectable string.
    pub fn is_narrowing(self) -> bool {
        matches!(self, CastKind::Int | CastKind::Bool | CastKind::Float)
    }
}

/// Callee of a free function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Statically known function name.
    Name(String),

    /// Call through a variable or computed callee.
    Dynamic,
}

/// Class reference of a static method call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassRef {
    /// Statically known class name.
    Name(String),

    /// `self` / `static`, resolved against the enclosing class.
    SelfClass,

    /// Computed class reference.
    Dynamic,
}

/// Host-supplied static type of an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StaticType {
    Bool,
    Int,
    Float,
    Str,

    /// An object type, with the declared ancestry the host resolved.
    Object {
        class: String,
        #[serde(default)]
        is_this: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        parents: Vec<String>,
    },

    /// A union of possible types.
    Union { members: Vec<StaticType> },

    /// Host could not resolve the type.
    Unknown,
}

impl StaticType {
    /// Whether values of this type cannot carry an injectable string.
    pub fn is_non_string_scalar(&self) -> bool {
        matches!(self, StaticType::Bool | StaticType::Int | StaticType::Float)
    }

    /// Resolves this type to an object class name, looking through unions.
    ///
    /// For a union the first object member wins; the host is expected to put
    /// the most specific resolution first.
    pub fn object_class(&self) -> Option<&StaticType> {
        match self {
            StaticType::Object { .. } => Some(self),
            StaticType::Union { members } => members.iter().find_map(|m| m.object_class()),
            _ => None,
        }
    }

    /// Whether this object type is `class` or declares it as an ancestor.
    pub fn is_a(&self, wanted: &str) -> bool {
        match self {
            StaticType::Object { class, parents, .. } => {
                class == wanted || parents.iter().any(|p| p == wanted)
            }
            StaticType::Union { members } => members.iter().any(|m| m.is_a(wanted)),
            _ => false,
        }
    }
}

/// Assignment target observed by the flow driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignTarget {
    /// A simple variable.
    Var { name: String },

    /// A destructuring list of variables; every target shares the verdict of
    /// the right-hand side.
    List { names: Vec<String> },
}

/// Statement-level operation routed by the flow driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOp {
    /// Assignment of a value to one or more variables.
    Assign { target: AssignTarget, value: Expr },

    /// An instance method call visited at statement/expression level.
    MethodCall { call: Expr },

    /// A static method call visited at statement/expression level.
    StaticCall { call: Expr },
}

/// One node of the host traversal, with its lexical context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    /// File the node belongs to.
    pub file: String,

    /// Enclosing class name, empty outside a class.
    #[serde(default)]
    pub class: String,

    /// Enclosing function name, empty at top level.
    #[serde(default)]
    pub function: String,

    /// The operation to route.
    pub op: FlowOp,
}

/// A complete analysis input: nodes in host traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStream {
    pub nodes: Vec<FlowNode>,
}
