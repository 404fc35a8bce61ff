//! Report selection and rendering tests
//!
//! The `relmap` binary prints whatever `CompiledSchema::reports` returns, as
//! text through `Display` or as JSON. These tests cover both against the
//! project tracker fixture.

use std::path::PathBuf;

use relmap::config::CompilerConfig;
use relmap::relation_catalog::{
    CatalogError, CompiledSchema, RelationSchemaConfig, SchemaCompiler,
};

fn compiled() -> CompiledSchema {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/schemas/project_tracker.yaml");
    let schema = RelationSchemaConfig::from_yaml_file(path)
        .unwrap_or_else(|e| panic!("Failed to load fixture: {}", e));
    SchemaCompiler::new(&CompilerConfig::default())
        .compile(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile fixture: {}", e))
}

fn names(requested: &[&str]) -> Vec<String> {
    requested.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_no_selection_reports_every_association() {
    let reports = compiled().reports(&[]).unwrap();
    let reported: Vec<_> = reports.iter().map(|report| report.name.as_str()).collect();
    assert_eq!(
        reported,
        vec!["project_tasks", "assignee", "members", "settings", "owner"]
    );
}

#[test]
fn test_selection_keeps_the_requested_order() {
    let reports = compiled().reports(&names(&["owner", "assignee"])).unwrap();
    let reported: Vec<_> = reports.iter().map(|report| report.name.as_str()).collect();
    assert_eq!(reported, vec!["owner", "assignee"]);
}

#[test]
fn test_unknown_association_is_an_error() {
    let schema = compiled();
    assert_eq!(
        schema.reports(&names(&["owner", "reviewers"])).unwrap_err(),
        CatalogError::UnknownAssociation {
            name: "reviewers".to_string()
        }
    );
    assert_eq!(
        schema
            .reports(&names(&["reviewers"]))
            .unwrap_err()
            .to_string(),
        "No association named `reviewers`"
    );
}

#[test]
fn test_text_output() {
    let reports = compiled().reports(&names(&["owner"])).unwrap();
    let text = reports[0].to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "owner (many_to_one: projects -> users)");
    assert_eq!(lines[1], "  join    owner_id = id");
    assert_eq!(lines[2], "  header  id, name, owner_id, owner_name, email");
    assert_eq!(lines.len(), 3 + 6);
    let expected = [
        format!("  {:<28} -> {}", "projects.name", "name"),
        format!("  {:<28} -> {} (aliased)", "users.name", "owner_name"),
        format!("  {:<28} -> {}", "users.email", "email"),
    ];
    for line in &expected {
        assert!(lines.contains(&line.as_str()), "missing {:?} in\n{}", line, text);
    }
}

#[test]
fn test_json_output() {
    let reports = compiled().reports(&names(&["settings", "owner"])).unwrap();
    let value = serde_json::to_value(&reports).unwrap();
    let array = value.as_array().unwrap();

    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["name"], "settings");
    assert_eq!(array[0]["kind"], "one_to_one");
    assert_eq!(array[1]["joins"][0], "owner_id = id");
    assert_eq!(array[1]["header"][3], "owner_name");
}
