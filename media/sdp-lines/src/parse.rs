//! nom helpers shared by the attribute parsers

use nom::Finish;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1, space1};
use nom::combinator::map_res;
use nom::error::VerboseError;
use nom::sequence::preceded;
use std::str::FromStr;

pub type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;

/// Failed to parse the value of a typed SDP line
#[derive(Debug, thiserror::Error)]
#[error("failed to parse {what}: {error}")]
pub struct ParseLineError {
    pub what: &'static str,
    pub error: VerboseError<String>,
}

impl ParseLineError {
    fn new(what: &'static str, error: VerboseError<&str>) -> Self {
        Self {
            what,
            error: VerboseError {
                errors: error
                    .errors
                    .into_iter()
                    .map(|(i, kind)| (i.to_owned(), kind))
                    .collect(),
            },
        }
    }
}

/// Run `parser` on the complete input and convert the error into an owned one
pub(crate) fn finish<'i, O>(
    what: &'static str,
    i: &'i str,
    mut parser: impl FnMut(&'i str) -> IResult<&'i str, O>,
) -> Result<O, ParseLineError> {
    parser(i)
        .finish()
        .map(|(_, o)| o)
        .map_err(|e| ParseLineError::new(what, e))
}

pub(crate) fn not_whitespace(c: char) -> bool {
    !c.is_ascii_whitespace()
}

/// Non-empty run of non-whitespace characters
pub(crate) fn token(i: &str) -> IResult<&str, &str> {
    take_while1(not_whitespace)(i)
}

/// Whitespace followed by a token
pub(crate) fn spaced_token(i: &str) -> IResult<&str, &str> {
    preceded(space1, token)(i)
}

pub(crate) fn number<T: FromStr>(i: &str) -> IResult<&str, T> {
    map_res(digit1, FromStr::from_str)(i)
}

pub(crate) fn slash_num(i: &str) -> IResult<&str, u32> {
    preceded(char('/'), number)(i)
}
