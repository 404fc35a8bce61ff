//! Relation schema configuration.
//!
//! Schemas describe base relations (name plus ordered field names, as the
//! dataset layer exposes them) and the associations between them:
//!
//! ```yaml
//! name: music
//! relations:
//!   - name: songs
//!     fields: [id, title]
//!   - name: song_tags
//!     fields: [song_id, tag_id]
//!   - name: tags
//!     fields: [id, name]
//! associations:
//!   - name: tags
//!     source: songs
//!     target: tags
//!     kind: many_to_many
//!     through:
//!       relation: song_tags
//!       source_key: song_id
//!       target_key: tag_id
//!   - name: taggings
//!     source: songs
//!     target: song_tags
//!     kind: one_to_many
//!     foreign_key: song_id
//!     as: taggings
//! ```
//!
//! Structural checks (duplicates, unknown relations) run in
//! [`RelationSchemaConfig::validate`]; key lookups are checked when the
//! associations are compiled.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::association::AssociationKind;
use super::errors::CatalogError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSchemaConfig {
    /// Optional schema name, used in log output
    #[serde(default)]
    pub name: Option<String>,
    pub relations: Vec<RelationDefinition>,
    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,
}

/// A base relation header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationDefinition {
    pub name: String,
    pub fields: Vec<String>,
}

impl RelationDefinition {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RelationDefinition {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Intermediate relation of a `through` association
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThroughDefinition {
    pub relation: String,
    /// Field of the join relation pointing at the source
    pub source_key: String,
    /// Field of the join relation pointing at the target
    pub target_key: String,
}

/// Association as written in the schema file. Converted into a typed
/// [`Association`](super::association::Association) before compilation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssociationDefinition {
    pub name: String,
    pub source: String,
    pub target: String,
    pub kind: AssociationKind,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub through: Option<ThroughDefinition>,
    /// Explicit name for the target relation in the joined header
    #[serde(default, rename = "as")]
    pub alias: Option<String>,
    /// Explicit join condition, e.g. `"id = song_id"`
    #[serde(default)]
    pub on: Option<String>,
}

impl RelationSchemaConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| CatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::ConfigReadError {
            error: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| CatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDefinition> {
        self.associations
            .iter()
            .find(|association| association.name == name)
    }

    /// Structural validation: unique, non-empty relations and associations that
    /// only reference known relations.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut relation_names = HashSet::new();
        for relation in &self.relations {
            if !relation_names.insert(relation.name.as_str()) {
                return Err(CatalogError::DuplicateRelation {
                    relation: relation.name.clone(),
                });
            }
            if relation.fields.is_empty() {
                return Err(CatalogError::EmptyRelation {
                    relation: relation.name.clone(),
                });
            }
            let mut fields = HashSet::new();
            for field in &relation.fields {
                if !fields.insert(field.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        relation: relation.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        let mut association_names = HashSet::new();
        for association in &self.associations {
            if !association_names.insert(association.name.as_str()) {
                return Err(CatalogError::DuplicateAssociation {
                    name: association.name.clone(),
                });
            }
            let mut referenced = vec![&association.source, &association.target];
            if let Some(through) = &association.through {
                referenced.push(&through.relation);
            }
            for relation in referenced {
                if !relation_names.contains(relation.as_str()) {
                    return Err(CatalogError::unknown_relation(
                        relation.as_str(),
                        association.name.as_str(),
                    ));
                }
            }
        }

        Ok(())
    }
}
