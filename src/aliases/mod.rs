//! # Aliases
//!
//! Lightweight provenance tracker for in-memory relation trees. Where an
//! [`AttributeIndex`](crate::attribute_index::AttributeIndex) follows every
//! identity, `Aliases` only keeps:
//!
//! - `entries`: entry key -> current field name, for the whole joined header
//! - `aliases`: original name -> current name, for the renames the last join
//!   introduced. This is what callers iterate to translate the names they coded
//!   against into the names a joined relation exposes.
//!
//! A fresh instance is [`AliasState::Unary`]; any join yields
//! [`AliasState::Binary`]. The state only changes how the left key of a join is
//! traced back to the field it currently occupies.

pub mod errors;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::attribute_index::JoinSide;
use crate::join_definition::JoinDefinition;
pub use errors::AliasError;

/// Join history of an [`Aliases`] value. Moves from `Unary` to `Binary` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasState {
    /// No join performed yet.
    Unary,
    /// Result of at least one join.
    Binary,
}

type FieldResolver = fn(&Aliases, &BTreeMap<String, String>, &str) -> Option<String>;

impl AliasState {
    /// How a left join key is traced to the field it currently occupies.
    fn resolver(self) -> FieldResolver {
        match self {
            AliasState::Unary => resolve_through_aliases,
            AliasState::Binary => resolve_through_entries,
        }
    }
}

/// Unary: the key is a current name, found through the inverted alias table.
fn resolve_through_aliases(
    aliases: &Aliases,
    _entries: &BTreeMap<String, String>,
    left_key: &str,
) -> Option<String> {
    aliases
        .aliases
        .iter()
        .find(|(_, current)| current.as_str() == left_key)
        .map(|(original, _)| original.clone())
}

/// Binary: the key is an entry key of the working entry table.
fn resolve_through_entries(
    _aliases: &Aliases,
    entries: &BTreeMap<String, String>,
    left_key: &str,
) -> Option<String> {
    entries.get(left_key).cloned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aliases {
    state: AliasState,
    entries: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl Aliases {
    pub fn unary(entries: BTreeMap<String, String>, aliases: BTreeMap<String, String>) -> Self {
        Aliases {
            state: AliasState::Unary,
            entries,
            aliases,
        }
    }

    /// Unary aliases for a base relation: every field maps to itself.
    pub fn for_header<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identity: BTreeMap<String, String> = fields
            .into_iter()
            .map(|field| (field.as_ref().to_string(), field.as_ref().to_string()))
            .collect();
        Self::unary(identity.clone(), identity)
    }

    pub fn state(&self) -> AliasState {
        self.state
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Current field names exposed by the relation.
    pub fn header(&self) -> BTreeSet<&str> {
        self.entries.values().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Current name of an entry key.
    pub fn alias(&self, name: &str) -> Result<&str, AliasError> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AliasError::AliasNotFound {
                name: name.to_string(),
            })
    }

    /// `(original, current)` pairs of the alias table.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(original, current)| (original.as_str(), current.as_str()))
    }

    pub fn each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str),
    {
        for (original, current) in self.iter() {
            f(original, current);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Join with `other`. Key pairs are processed in order; for each one the
    /// left key's field is renamed to the right key, together with every entry
    /// that had already been collapsed onto that field.
    pub fn join(&self, other: &Aliases, definition: &JoinDefinition) -> Result<Aliases, AliasError> {
        let resolve_field = self.state.resolver();
        let right_header = other.header();

        let mut entries = self.entries.clone();
        let mut aliases = BTreeMap::new();

        for pair in definition {
            let left_key = pair.left.to_string();
            let right_key = pair.right.to_string();

            let old_field = resolve_field(self, &entries, &left_key).ok_or_else(|| {
                AliasError::KeyNotFound {
                    key: left_key.clone(),
                    side: JoinSide::Left,
                }
            })?;
            if !right_header.contains(right_key.as_str()) {
                return Err(AliasError::KeyNotFound {
                    key: right_key,
                    side: JoinSide::Right,
                });
            }

            if entries.values().any(|current| *current == old_field) {
                aliases.insert(old_field.clone(), right_key.clone());
            }
            for current in entries.values_mut() {
                if *current == old_field {
                    *current = right_key.clone();
                }
            }
            entries.insert(left_key, right_key);
        }

        // left entries keep the names callers coded against
        for (key, current) in &other.entries {
            entries
                .entry(key.clone())
                .or_insert_with(|| current.clone());
        }

        log::debug!("Aliases after join on [{}]: {:?}", definition, aliases);

        Ok(Aliases {
            state: AliasState::Binary,
            entries,
            aliases,
        })
    }
}

impl<'a> IntoIterator for &'a Aliases {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.aliases.iter()
    }
}
