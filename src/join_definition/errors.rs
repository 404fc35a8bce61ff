use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum JoinDefinitionError {
    #[error("Join definition must contain at least one key pair")]
    Empty,

    #[error("Join key arity mismatch: {left} left key(s) but {right} right key(s)")]
    ArityMismatch { left: usize, right: usize },

    #[error("Unable to parse join condition `{input}` near `{position}`")]
    Parse { input: String, position: String },
}
