//! Parser for the textual join condition used in schema files.
//!
//! Grammar:
//!
//! ```text
//! condition  := key_pair ( (and | ",") key_pair )*
//! and        := "AND" not followed by an identifier character
//! key_pair   := attr_ref "=" attr_ref
//! attr_ref   := identifier ( "." identifier )?
//! identifier := [A-Za-z0-9_]+
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, not, opt},
    error::ParseError,
    multi::separated_list1,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};

use super::JoinKeyPair;
use crate::attribute_index::AttributeRef;

fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_identifier_char).parse(input)
}

/// `AND` as a whole word, so `and_c` stays an identifier.
fn and_keyword(input: &str) -> IResult<&str, &str> {
    terminated(tag_no_case("AND"), not(satisfy(is_identifier_char))).parse(input)
}

fn attribute_ref(input: &str) -> IResult<&str, AttributeRef> {
    (identifier, opt(preceded(char('.'), identifier)))
        .map(|(first, second)| match second {
            Some(field) => AttributeRef::qualified(first, field),
            None => AttributeRef::bare(first),
        })
        .parse(input)
}

fn key_pair(input: &str) -> IResult<&str, JoinKeyPair> {
    (ws(attribute_ref), char('='), ws(attribute_ref))
        .map(|(left, _, right)| JoinKeyPair { left, right })
        .parse(input)
}

/// Parse a whole join condition; trailing input is an error.
pub fn parse_join_condition(input: &str) -> IResult<&str, Vec<JoinKeyPair>> {
    all_consuming(separated_list1(
        ws(alt((and_keyword, tag(",")))),
        key_pair,
    ))
    .parse(input)
}
