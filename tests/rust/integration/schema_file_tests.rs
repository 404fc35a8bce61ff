//! Schema loading and rejection tests
//!
//! Schemas written to temporary files, loaded the way the CLI loads them, and
//! the load-time errors reported for broken ones.

use std::io::Write;

use relmap::attribute_index::{AttributeIndexError, JoinSide, JoinStrategy};
use relmap::config::CompilerConfig;
use relmap::relation_catalog::{CatalogError, RelationSchemaConfig, SchemaCompiler};
use tempfile::NamedTempFile;
use test_case::test_case;

const RELATIONS: &str = r#"
relations:
  - { name: users, fields: [id, name, manager_id] }
  - { name: teams, fields: [id, name] }
  - { name: team_members, fields: [team_id, user_id] }
"#;

fn write_schema(associations: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{}", RELATIONS)?;
    writeln!(file, "associations:")?;
    writeln!(file, "{}", associations)?;
    Ok(file)
}

fn compile_file(file: &NamedTempFile) -> Result<usize, CatalogError> {
    let schema = RelationSchemaConfig::from_yaml_file(file.path())?;
    let compiled = SchemaCompiler::new(&CompilerConfig::default()).compile(&schema)?;
    Ok(compiled.len())
}

#[test]
fn test_schema_file_round_trip() -> anyhow::Result<()> {
    let file = write_schema(
        r#"
  - { name: manager, source: users, target: users, kind: many_to_one, foreign_key: manager_id, as: manager }
  - name: teams
    source: users
    target: teams
    kind: many_to_many
    through: { relation: team_members, source_key: user_id, target_key: team_id }
"#,
    )?;

    let schema = RelationSchemaConfig::from_yaml_file(file.path())?;
    let compiled = SchemaCompiler::new(&CompilerConfig::default()).compile(&schema)?;
    assert_eq!(compiled.len(), 2);

    let manager = compiled.get("manager").unwrap();
    assert_eq!(manager.column_for("users_2.name")?, "manager_name");
    assert_eq!(
        manager.column_for("users.manager_id")?,
        manager.column_for("users_2.id")?
    );

    let teams = compiled.get("teams").unwrap();
    assert_eq!(teams.column_for("users.name")?, "name");
    assert_eq!(teams.column_for("teams.name")?, "teams_name");
    assert_eq!(
        teams.column_for("team_members.team_id")?,
        teams.column_for("teams.id")?
    );
    Ok(())
}

#[test]
fn test_json_schema_matches_yaml() -> anyhow::Result<()> {
    let json = r#"{
        "relations": [
            {"name": "teams", "fields": ["id", "name"]},
            {"name": "team_members", "fields": ["team_id", "user_id"]}
        ],
        "associations": [
            {"name": "members", "source": "teams", "target": "team_members",
             "kind": "one_to_many", "foreign_key": "team_id"}
        ]
    }"#;
    let schema = RelationSchemaConfig::from_json_str(json)?;
    let compiled = SchemaCompiler::new(&CompilerConfig::default()).compile(&schema)?;

    let members = compiled.get("members").unwrap();
    assert_eq!(members.header(), vec!["team_id", "name", "user_id"]);
    Ok(())
}

#[test_case(
    "  - { name: bad, source: users, target: teams, kind: many_to_many }",
    "many_to_many requires" ;
    "many to many without through"
)]
#[test_case(
    "  - { name: bad, source: users, target: users, kind: many_to_one, foreign_key: manager_id, through: { relation: team_members, source_key: user_id, target_key: team_id } }",
    "does not support `through`" ;
    "many to one with through"
)]
#[test_case(
    "  - { name: bad, source: users, target: teams, kind: many_to_many, on: \"id = id\", through: { relation: team_members, source_key: user_id, target_key: team_id } }",
    "cannot be combined" ;
    "on with through"
)]
#[test_case(
    "  - { name: bad, source: teams, target: team_members, kind: one_to_many }",
    "requires `foreign_key` or `on`" ;
    "direct association without keys"
)]
fn test_invalid_association_shapes(association: &str, reason_fragment: &str) {
    let file = write_schema(association).unwrap();
    match compile_file(&file) {
        Err(CatalogError::InvalidAssociation { name, reason }) => {
            assert_eq!(name, "bad");
            assert!(
                reason.contains(reason_fragment),
                "unexpected reason: {}",
                reason
            );
        }
        other => panic!("expected invalid association, got {:?}", other),
    }
}

#[test]
fn test_unparseable_on_condition() {
    let file = write_schema(
        "  - { name: bad, source: teams, target: team_members, kind: one_to_many, on: \"id => team_id\" }",
    )
    .unwrap();
    assert!(matches!(
        compile_file(&file),
        Err(CatalogError::JoinDefinition { association, .. }) if association == "bad"
    ));
}

#[test]
fn test_missing_key_names_the_side() {
    let file = write_schema(
        "  - { name: members, source: teams, target: team_members, kind: one_to_many, on: \"id = member_id\" }",
    )
    .unwrap();
    match compile_file(&file) {
        Err(CatalogError::Join {
            association,
            source: AttributeIndexError::KeyNotFound { key, side },
        }) => {
            assert_eq!(association, "members");
            assert_eq!(key, "member_id");
            assert_eq!(side, JoinSide::Right);
        }
        other => panic!("expected missing key, got {:?}", other),
    }
}

#[test]
fn test_malformed_yaml_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "relations: [{{ name: users, fields: [id").unwrap();
    assert!(matches!(
        RelationSchemaConfig::from_yaml_file(file.path()),
        Err(CatalogError::ConfigParseError { .. })
    ));
}

#[test]
fn test_compiler_config_file() -> anyhow::Result<()> {
    let mut config_file = NamedTempFile::new()?;
    writeln!(
        config_file,
        "default_primary_key: id\njoin_strategy: inner\nmax_associations: 1"
    )?;
    let config = CompilerConfig::from_yaml_file(config_file.path())?;
    assert_eq!(config.join_strategy, JoinStrategy::Inner);

    let file = write_schema(
        r#"
  - { name: a, source: teams, target: team_members, kind: one_to_many, foreign_key: team_id }
  - { name: b, source: users, target: team_members, kind: one_to_many, foreign_key: user_id }
"#,
    )?;
    let schema = RelationSchemaConfig::from_yaml_file(file.path())?;
    assert!(matches!(
        SchemaCompiler::new(&config).compile(&schema),
        Err(CatalogError::TooManyAssociations { count: 2, max: 1 })
    ));
    Ok(())
}
