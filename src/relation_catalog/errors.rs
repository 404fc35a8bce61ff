//! # Relation Catalog Error Types
//!
//! Errors raised while loading a relation schema and compiling its associations.
//! Every one of them is a schema/configuration problem detected at load time;
//! none is raised while tuples are being read.
//!
//! ## Error Categories
//!
//! - **Schema Errors**: unknown, duplicate or empty relations and associations
//! - **Association Errors**: invalid kind/through combinations, bad join conditions
//! - **Join Errors**: key lookups that fail while associations are compiled
//! - **Configuration Errors**: file I/O and parsing issues during schema loading

use thiserror::Error;

use crate::{
    aliases::AliasError, attribute_index::AttributeIndexError,
    join_definition::JoinDefinitionError,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("No relation named `{relation}` (referenced by association `{association}`)")]
    UnknownRelation {
        relation: String,
        association: String,
    },

    #[error("Relation `{relation}` is defined more than once")]
    DuplicateRelation { relation: String },

    #[error("Relation `{relation}` declares field `{field}` more than once")]
    DuplicateField { relation: String, field: String },

    #[error("Relation `{relation}` has no fields")]
    EmptyRelation { relation: String },

    #[error("Association `{name}` is defined more than once")]
    DuplicateAssociation { name: String },

    #[error("Invalid association `{name}`: {reason}")]
    InvalidAssociation { name: String, reason: String },

    #[error("No association named `{name}`")]
    UnknownAssociation { name: String },

    #[error("Schema defines {count} associations, the configured maximum is {max}")]
    TooManyAssociations { count: usize, max: usize },

    #[error("Invalid join condition in association `{association}`: {source}")]
    JoinDefinition {
        association: String,
        #[source]
        source: JoinDefinitionError,
    },

    #[error("Failed to join association `{association}`: {source}")]
    Join {
        association: String,
        #[source]
        source: AttributeIndexError,
    },

    #[error("Failed to alias association `{association}`: {source}")]
    Alias {
        association: String,
        #[source]
        source: AliasError,
    },

    #[error("Failed to index relation: {0}")]
    Index(#[from] AttributeIndexError),

    #[error("Failed to read schema file: {error}")]
    ConfigReadError { error: String },

    #[error("Failed to parse schema: {error}")]
    ConfigParseError { error: String },
}

impl CatalogError {
    pub fn invalid_association(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::InvalidAssociation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_relation(relation: impl Into<String>, association: impl Into<String>) -> Self {
        CatalogError::UnknownRelation {
            relation: relation.into(),
            association: association.into(),
        }
    }
}
