use thiserror::Error;

use crate::attribute_index::JoinSide;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AliasError {
    #[error("No alias entry for `{name}`")]
    AliasNotFound { name: String },

    #[error("Join key `{key}` not found on the {side} side of the join")]
    KeyNotFound { key: String, side: JoinSide },
}
