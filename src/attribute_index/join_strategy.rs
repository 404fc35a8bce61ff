//! Join resolution for attribute indexes.
//!
//! Given `left ⋈ right` and an ordered list of key pairs, compute the index of
//! the joined relation:
//!
//! 1. If `right` carries identities whose origin relation already exists on the
//!    left (self-join), the right copy is rebased onto a fresh relation instance
//!    (`relation_2`, `relation_3`, ...) so every identity stays distinct.
//! 2. Key pairs are resolved in the order given. For a natural join, every left
//!    entry in the left key's group adopts the right key's current name and
//!    group. That includes entries collapsed onto the same group by earlier
//!    joins, which keeps multi-hop chains consistent.
//! 3. Any right-side group whose exposed column would collide with a left-side
//!    group gets an aliased `qualifier_field` name (plus `_N` while still
//!    taken). Groups merged by a key never clash with themselves, and equal
//!    `CurrentName` values from unrelated groups still do. Non-key attributes
//!    of a self-join copy are always aliased.
//! 4. The adjusted left and right entries are concatenated into the result.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{
    AttributeEntry, AttributeIndex, AttributeIndexError, AttributeRef, CurrentName, JoinSide,
    UnknownJoinStrategy,
};
use crate::join_definition::{JoinDefinition, JoinKeyPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Key pairs collapse onto the right key's name.
    #[default]
    Natural,
    /// Key pairs are validated but both key columns stay in the header.
    Inner,
}

impl JoinStrategy {
    pub fn join(
        self,
        left: &AttributeIndex,
        right: &AttributeIndex,
        definition: &JoinDefinition,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        let (right, rebased) = disambiguate_self_join(left, right);

        let mut resolution = JoinResolution::seed(left, &right, &rebased);
        for pair in definition {
            resolution.resolve_key(pair, &rebased, self)?;
        }
        resolution.resolve_clashes();

        let joined = resolution.finish();
        log::debug!(
            "{} join on [{}] produced header {:?}",
            self,
            definition,
            joined.header()
        );
        Ok(joined)
    }

    fn collapses_keys(self) -> bool {
        matches!(self, JoinStrategy::Natural)
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStrategy::Natural => write!(f, "natural"),
            JoinStrategy::Inner => write!(f, "inner"),
        }
    }
}

impl FromStr for JoinStrategy {
    type Err = UnknownJoinStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" => Ok(JoinStrategy::Natural),
            "inner" => Ok(JoinStrategy::Inner),
            _ => Err(UnknownJoinStrategy(s.to_string())),
        }
    }
}

/// Working copy of both sides while a join is resolved. Consumed by `finish`.
struct JoinResolution {
    left: Vec<AttributeEntry>,
    right: Vec<AttributeEntry>,
    /// Key groups held by both sides because a key pair equated them.
    merged: HashSet<usize>,
    /// Relation instances created for the right side of a self-join.
    copies: HashSet<String>,
}

impl JoinResolution {
    fn seed(
        left: &AttributeIndex,
        right: &AttributeIndex,
        rebased: &HashMap<String, String>,
    ) -> Self {
        let offset = left
            .entries()
            .iter()
            .map(|entry| entry.slot() + 1)
            .max()
            .unwrap_or(0);
        let right = right
            .entries()
            .iter()
            .map(|entry| {
                AttributeEntry::new(
                    entry.identity.clone(),
                    entry.current.clone(),
                    entry.slot() + offset,
                )
            })
            .collect();

        JoinResolution {
            left: left.entries().to_vec(),
            right,
            merged: HashSet::new(),
            copies: rebased.values().cloned().collect(),
        }
    }

    fn resolve_key(
        &mut self,
        pair: &JoinKeyPair,
        rebased: &HashMap<String, String>,
        strategy: JoinStrategy,
    ) -> Result<(), AttributeIndexError> {
        let right_key = rebase_ref(&pair.right, rebased);
        let (left_slot, left_current) = find_group(&self.left, &pair.left, JoinSide::Left)?;
        let (right_slot, right_current) = find_group(&self.right, &right_key, JoinSide::Right)?;

        if !strategy.collapses_keys() {
            return Ok(());
        }

        log::debug!(
            "Join key {} = {}: `{}` now resolves to `{}`",
            pair.left,
            right_key,
            left_current.qualified(),
            right_current.qualified()
        );

        for entry in self
            .left
            .iter_mut()
            .filter(|entry| entry.slot() == left_slot)
        {
            *entry =
                AttributeEntry::new(entry.identity.clone(), right_current.clone(), right_slot);
        }
        self.merged.insert(right_slot);
        Ok(())
    }

    fn resolve_clashes(&mut self) {
        let mut left_names: HashMap<String, HashSet<usize>> = HashMap::new();
        for entry in &self.left {
            left_names
                .entry(entry.current.name())
                .or_default()
                .insert(entry.slot());
        }

        let mut taken: HashSet<String> = left_names.keys().cloned().collect();
        taken.extend(self.right.iter().map(|entry| entry.current.name()));

        let mut renames: HashMap<usize, CurrentName> = HashMap::new();
        for entry in &self.right {
            let current = &entry.current;
            if renames.contains_key(&entry.slot()) {
                continue;
            }
            let merged = self.merged.contains(&entry.slot());
            let copied = self.copies.contains(entry.identity.relation()) && !merged;
            let clashes = left_names
                .get(&current.name())
                .is_some_and(|held| held.iter().any(|slot| *slot != entry.slot()));
            if !clashes && !copied {
                continue;
            }

            let aliased = next_free_alias(current, &taken);
            log::debug!(
                "Name clash on `{}`{}: aliased as `{}`",
                current.name(),
                if merged { " (join key)" } else { "" },
                aliased.name()
            );
            taken.insert(aliased.name());
            renames.insert(entry.slot(), aliased);
        }

        if renames.is_empty() {
            return;
        }
        for entry in self.left.iter_mut().chain(self.right.iter_mut()) {
            if let Some(renamed) = renames.get(&entry.slot()) {
                entry.current = renamed.clone();
            }
        }
    }

    fn finish(self) -> AttributeIndex {
        let mut entries = self.left;
        entries.extend(self.right);
        AttributeIndex::from_entries(entries)
    }
}

/// The single key group (and its current name) `key` refers to on one side of
/// the join.
fn find_group(
    entries: &[AttributeEntry],
    key: &AttributeRef,
    side: JoinSide,
) -> Result<(usize, CurrentName), AttributeIndexError> {
    let mut found: Option<&AttributeEntry> = None;
    for entry in entries.iter().filter(|entry| key.matches_current(&entry.current)) {
        match found {
            None => found = Some(entry),
            Some(existing) if existing.slot() != entry.slot() => {
                return Err(AttributeIndexError::AmbiguousAttribute {
                    name: key.to_string(),
                    candidates: format!(
                        "{}, {}",
                        existing.current.qualified(),
                        entry.current.qualified()
                    ),
                });
            }
            Some(_) => {}
        }
    }

    found
        .map(|entry| (entry.slot(), entry.current.clone()))
        .ok_or_else(|| AttributeIndexError::KeyNotFound {
            key: key.to_string(),
            side,
        })
}

fn next_free_alias(current: &CurrentName, taken: &HashSet<String>) -> CurrentName {
    let mut ordinal = 1;
    loop {
        let candidate = current.aliased(ordinal);
        if !taken.contains(&candidate.name()) {
            return candidate;
        }
        ordinal += 1;
    }
}

/// Rebase right-side identities whose origin relation also occurs on the left.
/// Returns the (possibly) rewritten right index and the relation mapping used.
fn disambiguate_self_join<'a>(
    left: &AttributeIndex,
    right: &'a AttributeIndex,
) -> (Cow<'a, AttributeIndex>, HashMap<String, String>) {
    let left_relations = left.relations();
    let right_relations = right.relations();

    let mut mapping: HashMap<String, String> = HashMap::new();
    for relation in right_relations.intersection(&left_relations) {
        let mut ordinal = 2;
        let instance = loop {
            let candidate = format!("{}_{}", relation, ordinal);
            let in_use = left_relations.contains(candidate.as_str())
                || right_relations.contains(candidate.as_str())
                || mapping.values().any(|used| *used == candidate);
            if !in_use {
                break candidate;
            }
            ordinal += 1;
        };
        log::info!(
            "Self-join on `{}`: second copy joined as `{}`",
            relation,
            instance
        );
        mapping.insert(relation.to_string(), instance);
    }

    if mapping.is_empty() {
        (Cow::Borrowed(right), mapping)
    } else {
        (Cow::Owned(right.rebase_relations(&mapping)), mapping)
    }
}

fn rebase_ref(key: &AttributeRef, rebased: &HashMap<String, String>) -> AttributeRef {
    match key {
        AttributeRef::Qualified { qualifier, field } => match rebased.get(qualifier) {
            Some(instance) => AttributeRef::qualified(instance.as_str(), field.as_str()),
            None => key.clone(),
        },
        AttributeRef::Bare(_) => key.clone(),
    }
}
