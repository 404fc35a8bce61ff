//! Attribute identity and naming types
//!
//! Every attribute carried through a chain of joins has two names:
//!
//! - an [`AttributeIdentity`]: the relation it originates from plus its original
//!   field name. This never changes once the attribute exists.
//! - a [`CurrentName`]: the qualifier/field slot it occupies in the header of the
//!   relation it currently lives in. Joins produce new current names, never new
//!   identities.
//!
//! Callers address current names with an [`AttributeRef`], either bare (`title`)
//! or qualified (`songs.title`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key of an attribute: `(origin_relation, original_field)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeIdentity {
    relation: String,
    field: String,
}

impl AttributeIdentity {
    pub fn new(relation: impl Into<String>, field: impl Into<String>) -> Self {
        AttributeIdentity {
            relation: relation.into(),
            field: field.into(),
        }
    }

    /// Relation the attribute originates from.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Field name the attribute had in its origin relation.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Same field, different origin relation. Only used when a second copy of a
    /// relation enters a join (self-join rebasing).
    pub(crate) fn with_relation(&self, relation: &str) -> Self {
        AttributeIdentity {
            relation: relation.to_string(),
            field: self.field.clone(),
        }
    }
}

impl fmt::Display for AttributeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.field)
    }
}

/// The slot an attribute currently occupies in a relation header.
///
/// The exposed column name (see [`CurrentName::name`]) is the bare field unless
/// the attribute had to be disambiguated during a join, in which case it is
/// `qualifier_field` (with a numeric suffix if that was taken as well).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentName {
    qualifier: String,
    field: String,
    aliased: bool,
    /// 0 and 1 both render without a numeric suffix.
    #[serde(default, skip_serializing_if = "is_zero")]
    ordinal: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl CurrentName {
    pub fn new(qualifier: impl Into<String>, field: impl Into<String>) -> Self {
        CurrentName {
            qualifier: qualifier.into(),
            field: field.into(),
            aliased: false,
            ordinal: 0,
        }
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_aliased(&self) -> bool {
        self.aliased
    }

    /// `qualifier_field`, regardless of aliasing.
    pub fn qualified(&self) -> String {
        format!("{}_{}", self.qualifier, self.field)
    }

    /// Column name exposed in the joined tuple.
    pub fn name(&self) -> String {
        if !self.aliased {
            self.field.clone()
        } else if self.ordinal <= 1 {
            self.qualified()
        } else {
            format!("{}_{}", self.qualified(), self.ordinal)
        }
    }

    /// Disambiguated copy of this name. `ordinal` 1 renders as `qualifier_field`,
    /// higher ordinals append `_N`.
    pub(crate) fn aliased(&self, ordinal: u32) -> Self {
        CurrentName {
            qualifier: self.qualifier.clone(),
            field: self.field.clone(),
            aliased: true,
            ordinal,
        }
    }

    pub(crate) fn with_qualifier(&self, qualifier: &str) -> Self {
        CurrentName {
            qualifier: qualifier.to_string(),
            field: self.field.clone(),
            aliased: self.aliased,
            ordinal: self.ordinal,
        }
    }
}

impl fmt::Display for CurrentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Reference to an attribute by name, as written in join definitions and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AttributeRef {
    /// `field`: matched against the exposed column name.
    Bare(String),
    /// `qualifier.field`: matched against the qualifier and field parts.
    Qualified { qualifier: String, field: String },
}

impl AttributeRef {
    pub fn bare(field: impl Into<String>) -> Self {
        AttributeRef::Bare(field.into())
    }

    pub fn qualified(qualifier: impl Into<String>, field: impl Into<String>) -> Self {
        AttributeRef::Qualified {
            qualifier: qualifier.into(),
            field: field.into(),
        }
    }

    /// The field part (the whole name for bare references).
    pub fn field(&self) -> &str {
        match self {
            AttributeRef::Bare(field) => field,
            AttributeRef::Qualified { field, .. } => field,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            AttributeRef::Bare(_) => None,
            AttributeRef::Qualified { qualifier, .. } => Some(qualifier),
        }
    }

    /// Drop the qualifier, keeping only the field part.
    pub fn unqualified(&self) -> Self {
        AttributeRef::Bare(self.field().to_string())
    }

    pub fn matches_current(&self, current: &CurrentName) -> bool {
        match self {
            AttributeRef::Bare(name) => current.name() == *name,
            AttributeRef::Qualified { qualifier, field } => {
                current.qualifier() == qualifier && current.field() == field
            }
        }
    }

    pub fn matches_identity(&self, identity: &AttributeIdentity) -> bool {
        match self {
            AttributeRef::Bare(field) => identity.field() == field,
            AttributeRef::Qualified { qualifier, field } => {
                identity.relation() == qualifier && identity.field() == field
            }
        }
    }
}

impl From<&str> for AttributeRef {
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((qualifier, field)) => AttributeRef::qualified(qualifier, field),
            None => AttributeRef::bare(value),
        }
    }
}

impl From<String> for AttributeRef {
    fn from(value: String) -> Self {
        AttributeRef::from(value.as_str())
    }
}

impl From<&String> for AttributeRef {
    fn from(value: &String) -> Self {
        AttributeRef::from(value.as_str())
    }
}

impl From<AttributeRef> for String {
    fn from(value: AttributeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeRef::Bare(field) => f.write_str(field),
            AttributeRef::Qualified { qualifier, field } => write!(f, "{}.{}", qualifier, field),
        }
    }
}
