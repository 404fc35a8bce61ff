//! Schema compilation
//!
//! Walks every association of a [`RelationSchemaConfig`], runs its join plan
//! through [`AttributeIndex::join_with`] and [`Aliases::join`], and keeps the
//! resulting provenance for the header/struct builder to read from.
//!
//! Base-relation indexes are built once per compilation pass and memoized in a
//! [`HeaderCache`] owned by that pass.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use super::association::{Association, AssociationKind};
use super::config::{RelationDefinition, RelationSchemaConfig};
use super::errors::CatalogError;
use crate::aliases::Aliases;
use crate::attribute_index::{AttributeIndex, AttributeIndexError, AttributeRef};
use crate::config::CompilerConfig;
use crate::join_definition::JoinDefinition;

/// Base-relation indexes built during one compilation pass.
#[derive(Debug, Default)]
pub struct HeaderCache {
    indexes: HashMap<String, AttributeIndex>,
    hits: usize,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for a base relation, built on first use.
    pub fn index_for(
        &mut self,
        relation: &RelationDefinition,
    ) -> Result<AttributeIndex, AttributeIndexError> {
        if let Some(index) = self.indexes.get(&relation.name) {
            self.hits += 1;
            return Ok(index.clone());
        }
        let index = AttributeIndex::build(&relation.name, &relation.fields)?;
        self.indexes.insert(relation.name.clone(), index.clone());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// One column of a compiled association: which original attribute it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub attribute: String,
    pub column: String,
    pub qualified: String,
    pub aliased: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledAssociation {
    name: String,
    kind: AssociationKind,
    source: String,
    target: String,
    joins: Vec<JoinDefinition>,
    index: AttributeIndex,
    aliases: Aliases,
}

impl CompiledAssociation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Join definitions applied, in order.
    pub fn joins(&self) -> &[JoinDefinition] {
        &self.joins
    }

    pub fn index(&self) -> &AttributeIndex {
        &self.index
    }

    pub fn aliases(&self) -> &Aliases {
        &self.aliases
    }

    pub fn header(&self) -> Vec<String> {
        self.index.header()
    }

    /// Column to read off a joined tuple for an original attribute
    /// (`field` or `relation.field`).
    pub fn column_for(&self, original: impl Into<AttributeRef>) -> Result<String, AttributeIndexError> {
        self.index.resolve(original).map(|current| current.name())
    }

    pub fn columns(&self) -> Vec<ColumnMapping> {
        self.index
            .iter()
            .map(|entry| ColumnMapping {
                attribute: entry.identity.to_string(),
                column: entry.current.name(),
                qualified: entry.current.qualified(),
                aliased: entry.current.is_aliased(),
            })
            .collect()
    }

    pub fn report(&self) -> AssociationReport {
        AssociationReport {
            name: self.name.clone(),
            kind: self.kind,
            source: self.source.clone(),
            target: self.target.clone(),
            joins: self.joins.iter().map(ToString::to_string).collect(),
            header: self.header(),
            columns: self.columns(),
            aliases: self
                .aliases
                .iter()
                .map(|(original, current)| (original.to_string(), current.to_string()))
                .collect(),
        }
    }
}

/// Flat, serializable summary of a compiled association.
#[derive(Debug, Clone, Serialize)]
pub struct AssociationReport {
    pub name: String,
    pub kind: AssociationKind,
    pub source: String,
    pub target: String,
    pub joins: Vec<String>,
    pub header: Vec<String>,
    pub columns: Vec<ColumnMapping>,
    pub aliases: BTreeMap<String, String>,
}

/// Plain-text block: title line, joins, header, then one line per attribute.
impl fmt::Display for AssociationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}: {} -> {})",
            self.name, self.kind, self.source, self.target
        )?;
        for join in &self.joins {
            writeln!(f, "  join    {}", join)?;
        }
        writeln!(f, "  header  {}", self.header.join(", "))?;
        for column in &self.columns {
            let marker = if column.aliased { " (aliased)" } else { "" };
            writeln!(f, "  {:<28} -> {}{}", column.attribute, column.column, marker)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledSchema {
    name: Option<String>,
    associations: Vec<CompiledAssociation>,
}

impl CompiledSchema {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get(&self, association: &str) -> Option<&CompiledAssociation> {
        self.associations
            .iter()
            .find(|compiled| compiled.name == association)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledAssociation> {
        self.associations.iter()
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    /// Reports for the requested associations in the order asked, or for all
    /// of them when none are named.
    pub fn reports(&self, requested: &[String]) -> Result<Vec<AssociationReport>, CatalogError> {
        if requested.is_empty() {
            return Ok(self.iter().map(CompiledAssociation::report).collect());
        }
        requested
            .iter()
            .map(|name| {
                self.get(name)
                    .map(CompiledAssociation::report)
                    .ok_or_else(|| CatalogError::UnknownAssociation { name: name.clone() })
            })
            .collect()
    }
}

pub struct SchemaCompiler<'a> {
    config: &'a CompilerConfig,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        SchemaCompiler { config }
    }

    /// Compile every association of `schema`. Fails on the first association
    /// that cannot be resolved.
    pub fn compile(&self, schema: &RelationSchemaConfig) -> Result<CompiledSchema, CatalogError> {
        schema.validate()?;
        if schema.associations.len() > self.config.max_associations {
            return Err(CatalogError::TooManyAssociations {
                count: schema.associations.len(),
                max: self.config.max_associations,
            });
        }

        let mut cache = HeaderCache::new();
        let mut associations = Vec::with_capacity(schema.associations.len());
        for definition in &schema.associations {
            let association =
                Association::from_definition(definition, &self.config.default_primary_key)?;
            associations.push(self.compile_association(&association, schema, &mut cache)?);
        }

        log::info!(
            "Compiled {} association(s) for schema `{}` ({} relation index(es) built, {} reused)",
            associations.len(),
            schema.name.as_deref().unwrap_or("<unnamed>"),
            cache.len(),
            cache.hits()
        );

        Ok(CompiledSchema {
            name: schema.name.clone(),
            associations,
        })
    }

    pub fn compile_association(
        &self,
        association: &Association,
        schema: &RelationSchemaConfig,
        cache: &mut HeaderCache,
    ) -> Result<CompiledAssociation, CatalogError> {
        let name = association.name();
        let endpoints = association.endpoints();

        let source = lookup_relation(schema, &endpoints.source, name)?;
        let mut index = cache.index_for(source)?;
        let mut aliases = Aliases::for_header(&source.fields);
        let mut joins = Vec::new();

        for step in association.join_plan() {
            let relation = lookup_relation(schema, &step.relation, name)?;
            let join_error = |source| CatalogError::Join {
                association: name.to_string(),
                source,
            };
            let mut right = cache.index_for(relation)?;
            if step.qualifier != relation.name {
                let rename = HashMap::from([(relation.name.clone(), step.qualifier.clone())]);
                right = right.rename_relations(&rename).map_err(join_error)?;
            }
            index = index
                .join_with(&right, &step.definition, self.config.join_strategy)
                .map_err(join_error)?;
            if self.config.verify_invariants {
                index.check_invariants().map_err(join_error)?;
            }

            aliases = aliases
                .join(
                    &Aliases::for_header(&relation.fields),
                    &step.definition.unqualified(),
                )
                .map_err(|source| CatalogError::Alias {
                    association: name.to_string(),
                    source,
                })?;

            joins.push(step.definition);
        }

        log::debug!(
            "Association `{}` ({}): header {:?}",
            name,
            association.kind(),
            index.header()
        );

        Ok(CompiledAssociation {
            name: name.to_string(),
            kind: association.kind(),
            source: endpoints.source.clone(),
            target: endpoints.target.clone(),
            joins,
            index,
            aliases,
        })
    }
}

fn lookup_relation<'s>(
    schema: &'s RelationSchemaConfig,
    relation: &str,
    association: &str,
) -> Result<&'s RelationDefinition, CatalogError> {
    schema
        .relation(relation)
        .ok_or_else(|| CatalogError::unknown_relation(relation, association))
}
