//! Source attribute (`a=ssrc:...`)

use crate::parse::{IResult, ParseLineError, finish, number, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while1};
use nom::character::complete::{char, space1};
use nom::combinator::{map, opt};
use nom::error::context;
use nom::sequence::{preceded, separated_pair, tuple};
use std::fmt;

/// Media source attribute
///
/// [RFC5576](https://www.rfc-editor.org/rfc/rfc5576.html#section-4.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssrc {
    pub ssrc: u32,
    pub attribute: SourceAttribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceAttribute {
    CName {
        cname: BytesStr,
    },
    Msid {
        stream: BytesStr,
        track: Option<BytesStr>,
    },
    Other {
        name: BytesStr,
        value: Option<BytesStr>,
    },
}

impl Ssrc {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing ssrc-attribute",
            map(
                separated_pair(
                    number::<u32>,
                    space1,
                    alt((
                        // cname
                        map(preceded(tag("cname:"), token), |cname| {
                            SourceAttribute::CName {
                                cname: BytesStr::from_parse(src, cname),
                            }
                        }),
                        // msid
                        map(
                            preceded(tag("msid:"), tuple((token, opt(preceded(space1, token))))),
                            |(stream, track)| SourceAttribute::Msid {
                                stream: BytesStr::from_parse(src, stream),
                                track: track.map(|track| BytesStr::from_parse(src, track)),
                            },
                        ),
                        // other
                        map(
                            tuple((is_not(":"), opt(preceded(char(':'), take_while1(|_| true))))),
                            |(key, value): (&str, Option<&str>)| SourceAttribute::Other {
                                name: BytesStr::from_parse(src, key.trim_end()),
                                value: value.map(|value| BytesStr::from_parse(src, value)),
                            },
                        ),
                    )),
                ),
                |(ssrc, attribute)| Self { ssrc, attribute },
            ),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("ssrc", value.trim_end(), |i| Self::parse(line.as_ref(), i))
    }

    pub fn is_cname(&self) -> bool {
        matches!(self.attribute, SourceAttribute::CName { .. })
    }
}

impl fmt::Display for Ssrc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a=ssrc:{} ", self.ssrc)?;

        match &self.attribute {
            SourceAttribute::CName { cname } => write!(f, "cname:{cname}"),
            SourceAttribute::Msid {
                stream,
                track: Some(track),
            } => write!(f, "msid:{stream} {track}"),
            SourceAttribute::Msid {
                stream,
                track: None,
            } => write!(f, "msid:{stream}"),
            SourceAttribute::Other {
                name,
                value: Some(value),
            } => write!(f, "{name}:{value}"),
            SourceAttribute::Other { name, value: None } => write!(f, "{name}"),
        }
    }
}
