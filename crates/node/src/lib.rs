//! The typesetting node model.
//!
//! Eight structurally different node variants share one list interface.
//! Nodes live in a [`NodeArena`] and are addressed by [`NodeId`]; links are
//! plain ids, so a list is a chain of `next`/`prev` ids inside one arena.
//! The [`TypeRegistry`] exposes the per-variant fields by name so that a
//! dynamically typed caller can read and write them without knowing the
//! concrete variant up front.

use thiserror::Error;

mod arena;
mod debug;
mod kind;
pub mod registry;
mod variants;

pub use self::arena::{ListIter, NodeArena, NodeId};
pub use self::kind::NodeKind;
pub use self::registry::{Field, FieldKind, FieldValue, TypeRegistry, VariantTable};
pub use self::variants::{
    Container, Disc, Glue, Glyph, HList, ImageNode, LangNode, Node, NodeVariant, Penalty, VList,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("{expected} node expected, got {found} node")]
    TypeMismatch { expected: NodeKind, found: NodeKind },

    #[error("field '{field}' of {kind} nodes expects {expected}, got {found}")]
    InvalidFieldType {
        kind: NodeKind,
        field: String,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("unknown field '{field}' in {kind}")]
    UnknownField { kind: NodeKind, field: String },

    #[error("field '{field}' of {kind} nodes is read-only")]
    ReadOnlyField { kind: NodeKind, field: String },

    #[error("unknown node kind '{0}'")]
    UnknownKind(String),

    #[error("{kind} node {id} cannot contain a list that encloses itself")]
    CycleDetected { kind: NodeKind, id: NodeId },
}
