//! # Intermediate Representation Module
//!
//! @title Expression Tree and Flow Node Model
//! @author Ramprasad
//!
//! This module defines the language-independent expression tree consumed by
//! the trust classifier, together with the statement-level flow nodes a host
//! front end emits in traversal order.
//!
//! The host parser and its type inference are external: every tree arrives
//! fully built, optionally annotated with the static types the host was able
//! to resolve. Node streams are plain serde structures, so any front end that
//! can produce JSON can drive the analysis.
//!
//! ## Key Types
//!
//! - [`Expr`] / [`ExprKind`] - The closed expression tagged union
//! - [`StaticType`] - Host-supplied static type annotations
//! - [`FlowNode`] / [`FlowOp`] - Statement-level events in traversal order
//! - [`NodeStream`] - A deserialized analysis input document

mod expr;
mod render;

pub use expr::{
    ArrayItem, AssignTarget, Callee, CastKind, ClassRef, Expr, ExprKind, FlowNode, FlowOp,
    NodeStream, StaticType,
};
pub use render::render_expr;

use thiserror::Error;

/// Errors raised while reading a node-stream document.
#[derive(Debug, Error)]
pub enum IrError {
    /// The input file could not be read.
    #[error("failed to read node stream {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The input file is not a valid node-stream document.
    #[error("failed to parse node stream {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NodeStream {
    /// Loads a node-stream document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IrError`] if the file cannot be read or does not deserialize
    /// into a valid stream.
    pub fn from_path(path: &std::path::Path) -> Result<Self, IrError> {
        let text = std::fs::read_to_string(path).map_err(|source| IrError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| IrError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
