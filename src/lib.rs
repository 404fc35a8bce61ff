//! Relmap - attribute provenance for joined relations
//!
//! This crate keeps track of where every column of a joined relation came from:
//! - Attribute indexes mapping original `(relation, field)` identities to the
//!   names they are exposed under after a chain of joins
//! - Join definitions (ordered key pairs) and a small condition parser
//! - Lightweight alias tables for in-memory relation trees
//! - A relation catalog compiling association schemas into joined headers

pub mod aliases;
pub mod attribute_index;
pub mod config;
pub mod join_definition;
pub mod relation_catalog;
