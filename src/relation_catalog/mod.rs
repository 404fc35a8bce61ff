pub mod association;
pub mod compiler;
pub mod config;
pub mod errors;

// Re-export commonly used types
pub use association::{Association, AssociationEndpoints, AssociationKind, JoinStep};
pub use compiler::{
    AssociationReport, ColumnMapping, CompiledAssociation, CompiledSchema, HeaderCache,
    SchemaCompiler,
};
pub use config::{
    AssociationDefinition, RelationDefinition, RelationSchemaConfig, ThroughDefinition,
};
pub use errors::CatalogError;
