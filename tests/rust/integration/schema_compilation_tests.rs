//! Schema compilation tests against the project tracker fixture
//!
//! One association per kind: direct foreign keys, an aliased target, a
//! `through` relation and an explicit `on` condition.

use std::path::PathBuf;

use relmap::attribute_index::JoinStrategy;
use relmap::config::CompilerConfig;
use relmap::relation_catalog::{
    AssociationKind, CompiledAssociation, CompiledSchema, RelationSchemaConfig, SchemaCompiler,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/schemas")
        .join(name)
}

fn compile_with(config: &CompilerConfig) -> CompiledSchema {
    let schema = RelationSchemaConfig::from_yaml_file(fixture("project_tracker.yaml"))
        .unwrap_or_else(|e| panic!("Failed to load fixture: {}", e));
    SchemaCompiler::new(config)
        .compile(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile fixture: {}", e))
}

fn compiled() -> CompiledSchema {
    compile_with(&CompilerConfig::default())
}

fn association<'a>(schema: &'a CompiledSchema, name: &str) -> &'a CompiledAssociation {
    schema
        .get(name)
        .unwrap_or_else(|| panic!("association `{}` missing", name))
}

#[test]
fn test_all_associations_compile() {
    let schema = compiled();
    assert_eq!(schema.name(), Some("project_tracker"));
    assert_eq!(schema.len(), 5);

    let names: Vec<_> = schema.iter().map(|compiled| compiled.name()).collect();
    assert_eq!(
        names,
        vec!["project_tasks", "assignee", "members", "settings", "owner"]
    );
    for compiled in schema.iter() {
        compiled.index().check_invariants().unwrap();
    }
}

#[test]
fn test_one_to_many_moves_the_source_key() {
    let schema = compiled();
    let tasks = association(&schema, "project_tasks");

    assert_eq!(tasks.kind(), AssociationKind::OneToMany);
    assert_eq!(
        tasks.header(),
        vec!["project_id", "name", "owner_id", "id", "assignee_id", "tasks_name"]
    );
    // `id` now belongs to the task; the project's id lives in `project_id`
    assert_eq!(tasks.column_for("projects.id").unwrap(), "project_id");
    assert_eq!(tasks.column_for("tasks.project_id").unwrap(), "project_id");
    assert_eq!(tasks.column_for("tasks.id").unwrap(), "id");
    assert_eq!(tasks.column_for("tasks.name").unwrap(), "tasks_name");
    assert_eq!(tasks.column_for("projects.name").unwrap(), "name");
}

#[test]
fn test_many_to_one_uses_target_alias() {
    let schema = compiled();
    let assignee = association(&schema, "assignee");

    assert_eq!(assignee.kind(), AssociationKind::ManyToOne);
    assert_eq!(
        assignee.joins()[0].to_string(),
        "tasks.assignee_id = assignee.id"
    );
    assert_eq!(
        assignee.header(),
        vec!["id", "project_id", "assignee_id", "name", "assignee_name", "email"]
    );
    assert_eq!(assignee.column_for("users.id").unwrap(), "assignee_id");
    assert_eq!(assignee.column_for("tasks.assignee_id").unwrap(), "assignee_id");
    assert_eq!(assignee.column_for("users.name").unwrap(), "assignee_name");
    assert_eq!(assignee.column_for("email").unwrap(), "email");
}

#[test]
fn test_many_to_many_through_join_relation() {
    let schema = compiled();
    let members = association(&schema, "members");

    assert_eq!(members.kind(), AssociationKind::ManyToMany);
    assert_eq!(members.joins().len(), 2);
    assert_eq!(
        members.header(),
        vec!["project_id", "name", "owner_id", "id", "role", "users_name", "email"]
    );
    assert_eq!(
        members.column_for("memberships.user_id").unwrap(),
        members.column_for("users.id").unwrap()
    );
    assert_eq!(members.column_for("users.name").unwrap(), "users_name");

    let aliases = members.aliases();
    assert_eq!(aliases.alias("id").unwrap(), "project_id");
    assert_eq!(aliases.alias("user_id").unwrap(), "id");
    assert_eq!(aliases.alias("role").unwrap(), "role");
}

#[test]
fn test_one_to_one_and_explicit_condition() {
    let schema = compiled();

    let settings = association(&schema, "settings");
    assert_eq!(settings.kind(), AssociationKind::OneToOne);
    assert_eq!(
        settings.header(),
        vec!["project_id", "name", "owner_id", "visibility"]
    );

    let owner = association(&schema, "owner");
    assert_eq!(owner.joins()[0].to_string(), "owner_id = id");
    assert_eq!(
        owner.header(),
        vec!["id", "name", "owner_id", "owner_name", "email"]
    );
    assert_eq!(owner.column_for("projects.owner_id").unwrap(), "owner_id");
    assert_eq!(owner.column_for("users.id").unwrap(), "owner_id");
    assert_eq!(owner.column_for("projects.id").unwrap(), "id");
}

#[test]
fn test_inner_strategy_keeps_foreign_keys() {
    let config = CompilerConfig {
        join_strategy: JoinStrategy::Inner,
        ..Default::default()
    };
    let schema = compile_with(&config);
    let settings = association(&schema, "settings");

    assert_eq!(
        settings.header(),
        vec!["id", "name", "owner_id", "project_id", "visibility"]
    );
    assert_ne!(
        settings.column_for("projects.id").unwrap(),
        settings.column_for("project_settings.project_id").unwrap()
    );
}

#[test]
fn test_report_serializes_to_json() {
    let schema = compiled();
    let report = association(&schema, "assignee").report();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["name"], "assignee");
    assert_eq!(value["kind"], "many_to_one");
    assert_eq!(value["source"], "tasks");
    assert_eq!(value["target"], "users");
    assert_eq!(value["header"][2], "assignee_id");
    assert_eq!(value["aliases"]["assignee_id"], "id");

    let columns = value["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 7);
    let email = columns
        .iter()
        .find(|column| column["attribute"] == "users.email")
        .unwrap();
    assert_eq!(email["column"], "email");
    assert_eq!(email["aliased"], false);
}
