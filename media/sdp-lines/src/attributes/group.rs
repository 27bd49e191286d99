//! Grouping attribute (`a=group:...`)

use crate::parse::{IResult, ParseLineError, finish, spaced_token, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::combinator::map;
use nom::error::context;
use nom::multi::many0;
use nom::sequence::tuple;
use std::fmt;

/// Media grouping, e.g. `a=group:BUNDLE 0 1`
///
/// Session-Level attribute
///
/// [RFC5888](https://www.rfc-editor.org/rfc/rfc5888.html#section-5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub typ: BytesStr,
    /// Media identification tags, may be empty
    pub mids: Vec<BytesStr>,
}

impl Group {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing group",
            map(tuple((token, many0(spaced_token))), |(typ, mids)| Self {
                typ: BytesStr::from_parse(src, typ),
                mids: mids
                    .into_iter()
                    .map(|mid| BytesStr::from_parse(src, mid))
                    .collect(),
            }),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("group", value, |i| Self::parse(line.as_ref(), i))
    }

    pub fn bundle(mids: Vec<BytesStr>) -> Self {
        Self {
            typ: BytesStr::from_static("BUNDLE"),
            mids,
        }
    }

    pub fn is_bundle(&self) -> bool {
        self.typ.eq_ignore_ascii_case("BUNDLE")
    }

    pub fn contains(&self, mid: &str) -> bool {
        self.mids.iter().any(|m| m == mid)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a=group:{}", self.typ)?;

        for mid in &self.mids {
            write!(f, " {mid}")?;
        }

        Ok(())
    }
}
