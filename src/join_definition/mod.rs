//! Join definitions: the ordered equality predicates of a join.
//!
//! A definition is a non-empty, ordered list of `(left, right)` key pairs. Each
//! side is an [`AttributeRef`] naming a *current* attribute of the respective
//! relation. Pairs are always processed in the order given.
//!
//! # Example
//!
//! ```ignore
//! let simple = JoinDefinition::single("id", "song_id");
//! let composite = JoinDefinition::from_keys(["a", "b"], ["x", "y"])?;
//! let parsed = JoinDefinition::parse("song_tags.tag_id = tags.id")?;
//! ```

pub mod errors;
mod parser;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attribute_index::AttributeRef;
pub use errors::JoinDefinitionError;

/// One equality predicate of a join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinKeyPair {
    pub left: AttributeRef,
    pub right: AttributeRef,
}

impl JoinKeyPair {
    pub fn new(left: impl Into<AttributeRef>, right: impl Into<AttributeRef>) -> Self {
        JoinKeyPair {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl fmt::Display for JoinKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<JoinKeyPair>", into = "Vec<JoinKeyPair>")]
pub struct JoinDefinition {
    pairs: Vec<JoinKeyPair>,
}

impl JoinDefinition {
    pub fn new(pairs: Vec<JoinKeyPair>) -> Result<Self, JoinDefinitionError> {
        if pairs.is_empty() {
            return Err(JoinDefinitionError::Empty);
        }
        Ok(JoinDefinition { pairs })
    }

    /// Simple join on a single key pair.
    pub fn single(left: impl Into<AttributeRef>, right: impl Into<AttributeRef>) -> Self {
        JoinDefinition {
            pairs: vec![JoinKeyPair::new(left, right)],
        }
    }

    /// Zip two key lists into pairs. Both lists must have the same, non-zero length.
    pub fn from_keys<L, R>(left: L, right: R) -> Result<Self, JoinDefinitionError>
    where
        L: IntoIterator,
        L::Item: Into<AttributeRef>,
        R: IntoIterator,
        R::Item: Into<AttributeRef>,
    {
        let left: Vec<AttributeRef> = left.into_iter().map(Into::into).collect();
        let right: Vec<AttributeRef> = right.into_iter().map(Into::into).collect();
        if left.len() != right.len() {
            return Err(JoinDefinitionError::ArityMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Self::new(
            left.into_iter()
                .zip(right)
                .map(|(left, right)| JoinKeyPair { left, right })
                .collect(),
        )
    }

    /// Parse `a = b AND c.d = e.f`.
    pub fn parse(input: &str) -> Result<Self, JoinDefinitionError> {
        match parser::parse_join_condition(input) {
            Ok((_, pairs)) => Self::new(pairs),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                Err(JoinDefinitionError::Parse {
                    input: input.to_string(),
                    position: e.input.to_string(),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(JoinDefinitionError::Parse {
                input: input.to_string(),
                position: String::new(),
            }),
        }
    }

    pub fn pairs(&self) -> &[JoinKeyPair] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JoinKeyPair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_composite(&self) -> bool {
        self.pairs.len() > 1
    }

    /// Same pairs with qualifiers stripped from both sides.
    pub fn unqualified(&self) -> Self {
        JoinDefinition {
            pairs: self
                .pairs
                .iter()
                .map(|pair| JoinKeyPair {
                    left: pair.left.unqualified(),
                    right: pair.right.unqualified(),
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<JoinKeyPair>> for JoinDefinition {
    type Error = JoinDefinitionError;

    fn try_from(pairs: Vec<JoinKeyPair>) -> Result<Self, Self::Error> {
        Self::new(pairs)
    }
}

impl From<JoinDefinition> for Vec<JoinKeyPair> {
    fn from(definition: JoinDefinition) -> Self {
        definition.pairs
    }
}

impl FromStr for JoinDefinition {
    type Err = JoinDefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a JoinDefinition {
    type Item = &'a JoinKeyPair;
    type IntoIter = std::slice::Iter<'a, JoinKeyPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl fmt::Display for JoinDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", pair)?;
        }
        Ok(())
    }
}
