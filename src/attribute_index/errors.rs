//! Error types for attribute index construction and joins.
//!
//! All of these are configuration errors raised while a relation graph is being
//! compiled. None of them are transient.

use std::fmt;

use thiserror::Error;

/// Which side of a join a key reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttributeIndexError {
    #[error("No attribute found for `{name}`")]
    AttributeNotFound { name: String },

    #[error("Attribute `{name}` is ambiguous, candidates: {candidates}")]
    AmbiguousAttribute { name: String, candidates: String },

    #[error("Join key `{key}` not found on the {side} side of the join")]
    KeyNotFound { key: String, side: JoinSide },

    #[error("Relation `{relation}` declares field `{field}` more than once")]
    DuplicateField { relation: String, field: String },

    #[error("Relation name must not be empty")]
    EmptyRelationName,

    #[error("Header invariant violated: `{name}` is shared by unrelated attributes {identities}")]
    InvariantViolation { name: String, identities: String },

    #[error("Header invariant violated: key-equated attributes {identities} no longer share a name")]
    KeyGroupSplit { identities: String },

    #[error("Header invariant violated: identity `{identity}` appears more than once")]
    DuplicateIdentity { identity: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown join strategy `{0}`, expected `natural` or `inner`")]
pub struct UnknownJoinStrategy(pub String);
