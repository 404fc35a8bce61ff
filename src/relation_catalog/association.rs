//! Typed associations
//!
//! A schema's [`AssociationDefinition`] is loosely typed (every option is
//! optional). Before compilation it is turned into an [`Association`]: a closed
//! set of kinds, each carrying only the configuration that kind uses, with
//! `through` as an explicit modifier.
//!
//! Key conventions:
//! - `primary_key` names the key on the referenced ("one") side. It defaults to
//!   [`CompilerConfig::default_primary_key`](crate::config::CompilerConfig).
//! - `foreign_key` names the referencing field and has no default.
//! - An explicit `on` condition replaces the derived keys entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{AssociationDefinition, ThroughDefinition};
use super::errors::CatalogError;
use crate::attribute_index::AttributeRef;
use crate::join_definition::JoinDefinition;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    OneToMany,
    ManyToOne,
    OneToOne,
    ManyToMany,
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationKind::OneToMany => write!(f, "one_to_many"),
            AssociationKind::ManyToOne => write!(f, "many_to_one"),
            AssociationKind::OneToOne => write!(f, "one_to_one"),
            AssociationKind::ManyToMany => write!(f, "many_to_many"),
        }
    }
}

/// Relations an association connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationEndpoints {
    pub name: String,
    pub source: String,
    pub target: String,
    /// Name the target goes by in the joined header (`as:`)
    pub alias: Option<String>,
}

impl AssociationEndpoints {
    pub fn target_qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

/// Intermediate join relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    pub relation: String,
    pub source_key: String,
    pub target_key: String,
}

impl From<&ThroughDefinition> for Through {
    fn from(def: &ThroughDefinition) -> Self {
        Through {
            relation: def.relation.clone(),
            source_key: def.source_key.clone(),
            target_key: def.target_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKeys {
    /// `source_key` on the source side, `target_key` on the target side
    Derived {
        source_key: String,
        target_key: String,
    },
    Explicit(JoinDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneToManyConfig {
    pub endpoints: AssociationEndpoints,
    pub primary_key: String,
    /// Set for direct associations; `None` when going through a join relation
    pub keys: Option<JoinKeys>,
    pub through: Option<Through>,
    pub target_primary_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToOneConfig {
    pub endpoints: AssociationEndpoints,
    pub keys: JoinKeys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneToOneConfig {
    pub endpoints: AssociationEndpoints,
    pub keys: JoinKeys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToManyConfig {
    pub endpoints: AssociationEndpoints,
    pub source_primary_key: String,
    pub target_primary_key: String,
    pub through: Through,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    OneToMany(OneToManyConfig),
    ManyToOne(ManyToOneConfig),
    OneToOne(OneToOneConfig),
    ManyToMany(ManyToManyConfig),
}

/// One join performed while compiling an association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    /// Base relation joined in
    pub relation: String,
    /// Name the relation goes by in the joined header
    pub qualifier: String,
    pub definition: JoinDefinition,
}

impl Association {
    pub fn from_definition(
        def: &AssociationDefinition,
        default_primary_key: &str,
    ) -> Result<Self, CatalogError> {
        let endpoints = AssociationEndpoints {
            name: def.name.clone(),
            source: def.source.clone(),
            target: def.target.clone(),
            alias: def.alias.clone(),
        };
        let primary_key = def
            .primary_key
            .clone()
            .unwrap_or_else(|| default_primary_key.to_string());
        let through = def.through.as_ref().map(Through::from);

        if def.on.is_some() && through.is_some() {
            return Err(CatalogError::invalid_association(
                &def.name,
                "`on` cannot be combined with `through`",
            ));
        }

        let association = match def.kind {
            AssociationKind::OneToMany => {
                let keys = match &through {
                    Some(_) => {
                        reject_foreign_key(def, "the `through` relation supplies the keys")?;
                        None
                    }
                    None => Some(Self::join_keys(def, |fk| (primary_key.clone(), fk))?),
                };
                Association::OneToMany(OneToManyConfig {
                    endpoints,
                    primary_key,
                    keys,
                    through,
                    target_primary_key: default_primary_key.to_string(),
                })
            }
            AssociationKind::ManyToOne => {
                reject_through(def, &through)?;
                let keys = Self::join_keys(def, |fk| (fk, primary_key.clone()))?;
                Association::ManyToOne(ManyToOneConfig { endpoints, keys })
            }
            AssociationKind::OneToOne => {
                reject_through(def, &through)?;
                let keys = Self::join_keys(def, |fk| (primary_key.clone(), fk))?;
                Association::OneToOne(OneToOneConfig { endpoints, keys })
            }
            AssociationKind::ManyToMany => {
                let Some(through) = through else {
                    return Err(CatalogError::invalid_association(
                        &def.name,
                        "many_to_many requires a `through` relation",
                    ));
                };
                reject_foreign_key(def, "the `through` relation supplies the keys")?;
                Association::ManyToMany(ManyToManyConfig {
                    endpoints,
                    source_primary_key: primary_key.clone(),
                    target_primary_key: primary_key,
                    through,
                })
            }
        };

        Ok(association)
    }

    /// Explicit `on` condition, or derived keys built from the foreign key.
    fn join_keys<F>(def: &AssociationDefinition, derive: F) -> Result<JoinKeys, CatalogError>
    where
        F: FnOnce(String) -> (String, String),
    {
        if let Some(on) = &def.on {
            let definition =
                JoinDefinition::parse(on).map_err(|source| CatalogError::JoinDefinition {
                    association: def.name.clone(),
                    source,
                })?;
            return Ok(JoinKeys::Explicit(definition));
        }

        let foreign_key = def.foreign_key.clone().ok_or_else(|| {
            CatalogError::invalid_association(
                &def.name,
                format!("{} requires `foreign_key` or `on`", def.kind),
            )
        })?;
        let (source_key, target_key) = derive(foreign_key);
        Ok(JoinKeys::Derived {
            source_key,
            target_key,
        })
    }

    pub fn kind(&self) -> AssociationKind {
        match self {
            Association::OneToMany(_) => AssociationKind::OneToMany,
            Association::ManyToOne(_) => AssociationKind::ManyToOne,
            Association::OneToOne(_) => AssociationKind::OneToOne,
            Association::ManyToMany(_) => AssociationKind::ManyToMany,
        }
    }

    pub fn endpoints(&self) -> &AssociationEndpoints {
        match self {
            Association::OneToMany(config) => &config.endpoints,
            Association::ManyToOne(config) => &config.endpoints,
            Association::OneToOne(config) => &config.endpoints,
            Association::ManyToMany(config) => &config.endpoints,
        }
    }

    pub fn name(&self) -> &str {
        &self.endpoints().name
    }

    pub fn through(&self) -> Option<&Through> {
        match self {
            Association::OneToMany(config) => config.through.as_ref(),
            Association::ManyToMany(config) => Some(&config.through),
            Association::ManyToOne(_) | Association::OneToOne(_) => None,
        }
    }

    /// Joins that realise this association, in order, starting from the source.
    pub fn join_plan(&self) -> Vec<JoinStep> {
        let endpoints = self.endpoints();
        let target_step = |definition: JoinDefinition| JoinStep {
            relation: endpoints.target.clone(),
            qualifier: endpoints.target_qualifier().to_string(),
            definition,
        };

        match self {
            Association::OneToMany(OneToManyConfig {
                keys: Some(keys), ..
            })
            | Association::ManyToOne(ManyToOneConfig { keys, .. })
            | Association::OneToOne(OneToOneConfig { keys, .. }) => {
                vec![target_step(direct_definition(endpoints, keys))]
            }
            Association::OneToMany(OneToManyConfig {
                primary_key,
                through: Some(through),
                target_primary_key,
                ..
            }) => through_plan(endpoints, through, primary_key, target_primary_key),
            Association::ManyToMany(config) => through_plan(
                endpoints,
                &config.through,
                &config.source_primary_key,
                &config.target_primary_key,
            ),
            // from_definition never builds a one_to_many without keys or through
            Association::OneToMany(_) => vec![],
        }
    }
}

fn direct_definition(endpoints: &AssociationEndpoints, keys: &JoinKeys) -> JoinDefinition {
    match keys {
        JoinKeys::Explicit(definition) => definition.clone(),
        JoinKeys::Derived {
            source_key,
            target_key,
        } => JoinDefinition::single(
            AttributeRef::qualified(endpoints.source.as_str(), source_key.as_str()),
            AttributeRef::qualified(endpoints.target_qualifier(), target_key.as_str()),
        ),
    }
}

fn through_plan(
    endpoints: &AssociationEndpoints,
    through: &Through,
    source_primary_key: &str,
    target_primary_key: &str,
) -> Vec<JoinStep> {
    vec![
        JoinStep {
            relation: through.relation.clone(),
            qualifier: through.relation.clone(),
            definition: JoinDefinition::single(
                AttributeRef::qualified(endpoints.source.as_str(), source_primary_key),
                AttributeRef::qualified(through.relation.as_str(), through.source_key.as_str()),
            ),
        },
        JoinStep {
            relation: endpoints.target.clone(),
            qualifier: endpoints.target_qualifier().to_string(),
            definition: JoinDefinition::single(
                AttributeRef::qualified(through.relation.as_str(), through.target_key.as_str()),
                AttributeRef::qualified(endpoints.target_qualifier(), target_primary_key),
            ),
        },
    ]
}

fn reject_through(def: &AssociationDefinition, through: &Option<Through>) -> Result<(), CatalogError> {
    if through.is_some() {
        return Err(CatalogError::invalid_association(
            &def.name,
            format!("{} does not support `through`", def.kind),
        ));
    }
    Ok(())
}

fn reject_foreign_key(def: &AssociationDefinition, reason: &str) -> Result<(), CatalogError> {
    if def.foreign_key.is_some() {
        return Err(CatalogError::invalid_association(
            &def.name,
            format!("`foreign_key` is not used: {}", reason),
        ));
    }
    Ok(())
}
