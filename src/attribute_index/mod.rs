//! # Attribute Index
//!
//! Immutable mapping from each attribute's stable [`AttributeIdentity`] to the
//! [`CurrentName`] it is exposed under in a relation header.
//!
//! An index is created once per relation-construction step (a base relation via
//! [`AttributeIndex::build`], or the result of one [`AttributeIndex::join`]) and
//! is never modified afterwards. Every operation that "changes" an index returns
//! a new one; the input stays valid.
//!
//! ## Header invariant
//!
//! The header is the set of exposed column names. Two identities may share an
//! exposed name only when a join key equated them. Such entries belong to the
//! same key group (`slot`) and hold the identical `CurrentName`. Two entries
//! with equal names from different slots are a defect, reported by
//! [`AttributeIndex::check_invariants`].
//!
//! ## Example
//!
//! ```ignore
//! let songs = AttributeIndex::build("songs", ["id", "title"])?;
//! let song_tags = AttributeIndex::build("song_tags", ["song_id", "tag_id"])?;
//! let joined = songs.join(&song_tags, &JoinDefinition::single("id", "song_id"))?;
//!
//! assert_eq!(joined.resolve("songs.id")?.field(), "song_id");
//! ```

pub mod errors;
mod identity;
mod join_strategy;


use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::join_definition::JoinDefinition;
pub use errors::{AttributeIndexError, JoinSide, UnknownJoinStrategy};
pub use identity::{AttributeIdentity, AttributeRef, CurrentName};
pub use join_strategy::JoinStrategy;

/// One `identity -> current name` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub identity: AttributeIdentity,
    pub current: CurrentName,
    /// Key group: entries equated by join keys share a slot.
    slot: usize,
}

impl AttributeEntry {
    pub(crate) fn new(identity: AttributeIdentity, current: CurrentName, slot: usize) -> Self {
        AttributeEntry {
            identity,
            current,
            slot,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    fn with_current(&self, current: CurrentName) -> Self {
        AttributeEntry::new(self.identity.clone(), current, self.slot)
    }

    pub fn is_aliased(&self) -> bool {
        self.current.is_aliased()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeIndex {
    entries: Vec<AttributeEntry>,
}

impl AttributeIndex {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Index for a base relation. Every field is qualified with the relation name,
    /// so no two entries can collide before any join happens.
    pub fn build<I, S>(relation: &str, fields: I) -> Result<Self, AttributeIndexError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if relation.is_empty() {
            return Err(AttributeIndexError::EmptyRelationName);
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (slot, field) in fields.into_iter().enumerate() {
            let field = field.as_ref();
            if !seen.insert(field.to_string()) {
                return Err(AttributeIndexError::DuplicateField {
                    relation: relation.to_string(),
                    field: field.to_string(),
                });
            }
            entries.push(AttributeEntry::new(
                AttributeIdentity::new(relation, field),
                CurrentName::new(relation, field),
                slot,
            ));
        }

        Ok(AttributeIndex { entries })
    }

    /// Wrap already-resolved entries. Callers inside the crate are responsible
    /// for having produced a header that satisfies the invariant. Slots are
    /// renumbered in order of first appearance.
    pub(crate) fn from_entries(mut entries: Vec<AttributeEntry>) -> Self {
        let mut renumbered: HashMap<usize, usize> = HashMap::new();
        for entry in &mut entries {
            let next = renumbered.len();
            let slot = *renumbered.entry(entry.slot).or_insert(next);
            entry.slot = slot;
        }
        let index = AttributeIndex { entries };
        debug_assert!(
            index.check_invariants().is_ok(),
            "join resolution produced an invalid header: {:?}",
            index.check_invariants()
        );
        index
    }

    // ========================================================================
    // Read-only access
    // ========================================================================

    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct exposed column names, in entry order.
    pub fn header(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|entry| entry.current.name())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Origin relations of all identities in this index.
    pub fn relations(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|entry| entry.identity.relation())
            .collect()
    }

    /// True if any identity is currently exposed under `current`.
    pub fn is_attribute(&self, current: impl Into<AttributeRef>) -> bool {
        let current = current.into();
        self.entries
            .iter()
            .any(|entry| current.matches_current(&entry.current))
    }

    /// Reverse lookup by original field name (`field` or `relation.field`).
    ///
    /// A bare name matching identities from several relations is ambiguous; use
    /// the qualified form in that case.
    pub fn attribute(
        &self,
        original: impl Into<AttributeRef>,
    ) -> Result<&AttributeIdentity, AttributeIndexError> {
        let original = original.into();
        let matches: Vec<&AttributeIdentity> = self
            .entries
            .iter()
            .map(|entry| &entry.identity)
            .filter(|identity| original.matches_identity(identity))
            .collect();

        match matches.as_slice() {
            [] => Err(AttributeIndexError::AttributeNotFound {
                name: original.to_string(),
            }),
            [identity] => Ok(identity),
            many => Err(AttributeIndexError::AmbiguousAttribute {
                name: original.to_string(),
                candidates: join_display(many.iter()),
            }),
        }
    }

    /// Current name of an identity, if present.
    pub fn current(&self, identity: &AttributeIdentity) -> Option<&CurrentName> {
        self.entries
            .iter()
            .find(|entry| &entry.identity == identity)
            .map(|entry| &entry.current)
    }

    /// Current name for an original field name; see [`AttributeIndex::attribute`].
    pub fn resolve(
        &self,
        original: impl Into<AttributeRef>,
    ) -> Result<&CurrentName, AttributeIndexError> {
        let identity = self.attribute(original)?;
        self.current(identity)
            .ok_or_else(|| AttributeIndexError::AttributeNotFound {
                name: identity.to_string(),
            })
    }

    /// All identities currently exposed under `current`.
    pub fn identities_for(&self, current: impl Into<AttributeRef>) -> Vec<&AttributeIdentity> {
        let current = current.into();
        self.entries
            .iter()
            .filter(|entry| current.matches_current(&entry.current))
            .map(|entry| &entry.identity)
            .collect()
    }

    // ========================================================================
    // Joins
    // ========================================================================

    /// Natural join with `other`; see [`JoinStrategy::Natural`].
    pub fn join(
        &self,
        other: &AttributeIndex,
        definition: &JoinDefinition,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        JoinStrategy::Natural.join(self, other, definition)
    }

    pub fn join_with(
        &self,
        other: &AttributeIndex,
        definition: &JoinDefinition,
        strategy: JoinStrategy,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        strategy.join(self, other, definition)
    }

    // ========================================================================
    // Renaming
    // ========================================================================

    /// Requalify entries by original field name (`field -> new qualifier`).
    ///
    /// Fails when the result breaks the header invariant: two unrelated
    /// attributes ending up on one column, or a key group split apart.
    pub fn rename_attributes(
        &self,
        mapping: &HashMap<String, String>,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        self.requalify(|entry| mapping.get(entry.identity.field()))
    }

    /// Requalify entries by current qualifier (`old qualifier -> new qualifier`).
    /// Used when a relation is aliased as a whole. Fails like
    /// [`AttributeIndex::rename_attributes`].
    pub fn rename_relations(
        &self,
        mapping: &HashMap<String, String>,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        self.requalify(|entry| mapping.get(entry.current.qualifier()))
    }

    fn requalify<'m, F>(&self, new_qualifier: F) -> Result<AttributeIndex, AttributeIndexError>
    where
        F: Fn(&AttributeEntry) -> Option<&'m String>,
    {
        let entries = self
            .entries
            .iter()
            .map(|entry| match new_qualifier(entry) {
                Some(qualifier) => entry.with_current(entry.current.with_qualifier(qualifier)),
                None => entry.clone(),
            })
            .collect();
        let renamed = AttributeIndex { entries };
        renamed.check_invariants()?;
        Ok(renamed)
    }

    /// Move identities (and qualifiers) of the given origin relations onto new
    /// relation names. Used to give the second copy of a relation in a self-join
    /// its own identities.
    pub(crate) fn rebase_relations(&self, mapping: &HashMap<String, String>) -> AttributeIndex {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let identity = match mapping.get(entry.identity.relation()) {
                    Some(relation) => entry.identity.with_relation(relation),
                    None => entry.identity.clone(),
                };
                let current = match mapping.get(entry.current.qualifier()) {
                    Some(qualifier) => entry.current.with_qualifier(qualifier),
                    None => entry.current.clone(),
                };
                AttributeEntry::new(identity, current, entry.slot)
            })
            .collect();
        AttributeIndex { entries }
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Verify that identities are unique, that every exposed name belongs to a
    /// single key group, and that every key group holds a single `CurrentName`.
    pub fn check_invariants(&self) -> Result<(), AttributeIndexError> {
        let mut identities = HashSet::new();
        let mut by_name: HashMap<String, &AttributeEntry> = HashMap::new();
        let mut by_slot: HashMap<usize, &AttributeEntry> = HashMap::new();

        for entry in &self.entries {
            if !identities.insert(&entry.identity) {
                return Err(AttributeIndexError::DuplicateIdentity {
                    identity: entry.identity.to_string(),
                });
            }

            let name = entry.current.name();
            if let Some(existing) = by_name.get(&name) {
                if existing.slot != entry.slot {
                    return Err(AttributeIndexError::InvariantViolation {
                        name,
                        identities: format!("{} and {}", existing.identity, entry.identity),
                    });
                }
            } else {
                by_name.insert(name, entry);
            }

            if let Some(existing) = by_slot.get(&entry.slot) {
                if existing.current != entry.current {
                    return Err(AttributeIndexError::KeyGroupSplit {
                        identities: format!("{} and {}", existing.identity, entry.identity),
                    });
                }
            } else {
                by_slot.insert(entry.slot, entry);
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a AttributeIndex {
    type Item = &'a AttributeEntry;
    type IntoIter = std::slice::Iter<'a, AttributeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn join_display<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
