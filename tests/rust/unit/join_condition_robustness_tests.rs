//! Unit tests for join condition parsing edge cases
//!
//! Malformed conditions must come back as errors, never panics, and
//! well-formed ones must keep key pairs in the order written.

use relmap::attribute_index::AttributeRef;
use relmap::join_definition::{JoinDefinition, JoinDefinitionError};
use test_case::test_case;

#[test_case("" ; "empty")]
#[test_case("   " ; "whitespace only")]
#[test_case("id" ; "missing equals")]
#[test_case("id =" ; "missing right key")]
#[test_case("= song_id" ; "missing left key")]
#[test_case("id == song_id" ; "double equals")]
#[test_case("id = song_id AND" ; "dangling and")]
#[test_case("id = song_id,," ; "double comma")]
#[test_case("songs. = tags.id" ; "empty field")]
#[test_case("songs.id.x = tags.id" ; "three part name")]
#[test_case("id = song_id OR tag_id = id" ; "or is not supported")]
#[test_case("id = 'song_id'" ; "quoted name")]
#[test_case("a = b and_c = d" ; "and glued to the next key")]
#[test_case("a = b ANDc = d" ; "uppercase and glued to the next key")]
fn test_malformed_conditions_are_rejected(input: &str) {
    match JoinDefinition::parse(input) {
        Err(JoinDefinitionError::Parse { input: reported, .. }) => assert_eq!(reported, input),
        other => panic!("expected parse error for {:?}, got {:?}", input, other),
    }
}

#[test_case("id = song_id", 1 ; "single bare pair")]
#[test_case("songs.id = song_tags.song_id", 1 ; "single qualified pair")]
#[test_case("a = b AND c = d", 2 ; "and separator")]
#[test_case("a = b and c = d and e = f", 3 ; "lowercase and")]
#[test_case("a=b,c=d", 2 ; "comma separator without spaces")]
#[test_case("\n  a = b\n  AND c.x = d.y\n", 2 ; "multiline")]
#[test_case("android = band AND and_c = d", 2 ; "identifiers containing and")]
fn test_valid_conditions_parse(input: &str, pairs: usize) {
    let definition = JoinDefinition::parse(input).unwrap();
    assert_eq!(definition.len(), pairs);
    assert_eq!(definition.is_composite(), pairs > 1);
}

#[test]
fn test_pair_order_is_preserved() {
    let definition = JoinDefinition::parse("tag_id = id AND song_id = songs.id").unwrap();
    let left: Vec<_> = definition.iter().map(|pair| pair.left.clone()).collect();
    let right: Vec<_> = definition.iter().map(|pair| pair.right.clone()).collect();

    assert_eq!(left, vec![AttributeRef::bare("tag_id"), AttributeRef::bare("song_id")]);
    assert_eq!(
        right,
        vec![AttributeRef::bare("id"), AttributeRef::qualified("songs", "id")]
    );
}

#[test]
fn test_display_parses_back_to_the_same_definition() {
    let definition = JoinDefinition::parse("song_tags.tag_id = tags.id, kind = kind").unwrap();
    let printed = definition.to_string();
    assert_eq!(printed, "song_tags.tag_id = tags.id AND kind = kind");
    assert_eq!(JoinDefinition::parse(&printed).unwrap(), definition);
}

#[test]
fn test_from_keys_arity() {
    assert!(JoinDefinition::from_keys(["a", "b"], ["x", "y"]).is_ok());
    assert_eq!(
        JoinDefinition::from_keys(["a", "b"], ["x"]).unwrap_err(),
        JoinDefinitionError::ArityMismatch { left: 2, right: 1 }
    );
    assert_eq!(
        JoinDefinition::from_keys(Vec::<&str>::new(), Vec::<&str>::new()).unwrap_err(),
        JoinDefinitionError::Empty
    );
}
