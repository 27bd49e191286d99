//! ICE Candidate (`a=candidate:...`)

use crate::parse::{IResult, ParseLineError, finish, number, spaced_token, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::tag;
use nom::character::complete::space1;
use nom::combinator::{map, opt};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::{preceded, tuple};
use std::fmt;

/// Candidate type (`typ` field)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateType {
    /// host
    Host,
    /// server reflexive
    Srflx,
    /// peer reflexive
    Prflx,
    /// relayed candidate
    Relay,
    Other(BytesStr),
}

impl CandidateType {
    fn from_token(src: &Bytes, token: &str) -> Self {
        match token {
            "host" => CandidateType::Host,
            "srflx" => CandidateType::Srflx,
            "prflx" => CandidateType::Prflx,
            "relay" => CandidateType::Relay,
            _ => CandidateType::Other(BytesStr::from_parse(src, token)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CandidateType::Host => "host",
            CandidateType::Srflx => "srflx",
            CandidateType::Prflx => "prflx",
            CandidateType::Relay => "relay",
            CandidateType::Other(other) => other.as_str(),
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SDP ICE Candidate
///
/// [RFC5245](https://tools.ietf.org/html/rfc5245#section-15.1)
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Session unique ID assigned to the candidate
    pub foundation: BytesStr,

    /// Identifies the specific component of the media stream for which this is a candidate.
    ///
    /// e.g. RTP is 1 and RTCP is 2
    pub component: u32,

    /// Transport protocol used by the candidate.
    ///
    /// Usually UDP or TCP
    pub transport: BytesStr,

    /// Candidate priority
    pub priority: u64,

    /// Address of the candidate, either an IP address or a FQDN
    pub address: BytesStr,

    /// Port of the candidate
    pub port: u16,

    pub typ: CandidateType,

    /// Required for candidate typ `srflx`, `prflx` and `relay`
    pub rel_addr: Option<BytesStr>,

    /// Required for candidate typ `srflx`, `prflx` and `relay`
    pub rel_port: Option<u16>,

    /// Params that aren't known to this crate
    pub unknown: Vec<(BytesStr, BytesStr)>,
}

impl Candidate {
    /// Parse a candidate, the `candidate:` prefix is optional
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing candidate",
            map(
                tuple((
                    opt(tag("candidate:")),
                    // foundation
                    token,
                    // component id
                    preceded(space1, number::<u32>),
                    // transport
                    spaced_token,
                    // priority
                    preceded(space1, number::<u64>),
                    // address
                    spaced_token,
                    // port
                    preceded(space1, number::<u16>),
                    // candidate type
                    preceded(tuple((space1, tag("typ"))), spaced_token),
                    // extensions
                    many0(tuple((spaced_token, spaced_token))),
                )),
                |(_, foundation, component, transport, priority, address, port, typ, p_ext)| {
                    let mut unknown = vec![];

                    let mut rel_addr = None;
                    let mut rel_port = None;

                    for (key, value) in p_ext {
                        match key {
                            "raddr" => rel_addr = Some(BytesStr::from_parse(src, value)),
                            "rport" => rel_port = value.parse().ok(),
                            _ => unknown.push((
                                BytesStr::from_parse(src, key),
                                BytesStr::from_parse(src, value),
                            )),
                        }
                    }

                    Candidate {
                        foundation: BytesStr::from_parse(src, foundation),
                        component,
                        transport: BytesStr::from_parse(src, transport),
                        priority,
                        address: BytesStr::from_parse(src, address),
                        port,
                        typ: CandidateType::from_token(src, typ),
                        rel_addr,
                        rel_port,
                        unknown,
                    }
                },
            ),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("candidate", value, |i| Self::parse(line.as_ref(), i))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "candidate:{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.transport,
            self.priority,
            self.address,
            self.port,
            self.typ
        )?;

        if let Some(rel_addr) = &self.rel_addr {
            write!(f, " raddr {rel_addr}")?;
        }

        if let Some(rel_port) = &self.rel_port {
            write!(f, " rport {rel_port}")?;
        }

        for (key, value) in &self.unknown {
            write!(f, " {key} {value}")?;
        }

        Ok(())
    }
}
