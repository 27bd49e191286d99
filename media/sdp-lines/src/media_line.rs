//! Media field (`m=`)

use crate::parse::{IResult, ParseLineError, finish, number, slash_num, spaced_token, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::character::complete::space1;
use nom::combinator::{map, opt};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::{preceded, tuple};
use std::fmt;

/// Kind of media a media section describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    /// `m=application`, used for data channels
    Data,
    /// Any other media type, e.g. `text`
    Other,
}

impl MediaKind {
    pub fn from_token(token: &str) -> Self {
        match token {
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            "application" => MediaKind::Data,
            _ => MediaKind::Other,
        }
    }

    /// Returns true for media kinds which carry RTP with a direction attribute
    pub fn is_rtp(&self) -> bool {
        matches!(self, MediaKind::Audio | MediaKind::Video)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Data => "data",
            MediaKind::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed media field
///
/// `fmts` holds the payload type order for RTP media, or any other format tokens (e.g. `webrtc-datachannel`).
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.14)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLine {
    /// Media type as written, e.g. `audio` or `application`
    pub media: BytesStr,
    pub port: u16,
    pub ports_num: Option<u32>,
    pub proto: BytesStr,
    pub fmts: Vec<BytesStr>,
}

impl MediaLine {
    /// Parse the value of a media field (everything after `m=`)
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing media field",
            map(
                tuple((
                    token,
                    preceded(space1, number::<u16>),
                    opt(slash_num),
                    spaced_token,
                    many0(spaced_token),
                )),
                |(media, port, ports_num, proto, fmts)| MediaLine {
                    media: BytesStr::from_parse(src, media),
                    port,
                    ports_num,
                    proto: BytesStr::from_parse(src, proto),
                    fmts: fmts
                        .into_iter()
                        .map(|fmt| BytesStr::from_parse(src, fmt))
                        .collect(),
                },
            ),
        )(i)
    }

    /// Parse a complete `m=` line
    pub fn from_line(line: &BytesStr) -> Result<Self, ParseLineError> {
        let value = line.strip_prefix("m=").unwrap_or(line.as_str());

        finish("media field", value, |i| Self::parse(line.as_ref(), i))
    }

    /// Parse a `m=` line, splitting on whitespace if it does not follow the grammar
    pub fn parse_lenient(line: &BytesStr) -> Self {
        if let Ok(media) = Self::from_line(line) {
            return media;
        }

        let value = line.strip_prefix("m=").unwrap_or(line.as_str());
        let mut parts = value.split_ascii_whitespace();

        let media = parts.next().unwrap_or_default();
        let port = parts.next().unwrap_or_default();
        let proto = parts.next().unwrap_or_default();

        MediaLine {
            media: BytesStr::from(media.to_owned()),
            port: port.split('/').next().and_then(|p| p.parse().ok()).unwrap_or(0),
            ports_num: None,
            proto: BytesStr::from(proto.to_owned()),
            fmts: parts.map(|fmt| BytesStr::from(fmt.to_owned())).collect(),
        }
    }

    /// Payload types in the order they are listed, skipping non numeric formats
    pub fn payload_types(&self) -> impl Iterator<Item = u8> + '_ {
        self.fmts.iter().filter_map(|fmt| fmt.parse().ok())
    }

    /// Remove the payload type from the format list, returns true if it was listed
    pub fn remove_payload_type(&mut self, pt: u8) -> bool {
        let before = self.fmts.len();
        self.fmts.retain(|fmt| fmt.parse::<u8>() != Ok(pt));
        before != self.fmts.len()
    }
}

impl fmt::Display for MediaLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m={} {}", self.media, self.port)?;

        if let Some(ports_num) = self.ports_num {
            write!(f, "/{ports_num}")?;
        }

        write!(f, " {}", self.proto)?;

        for fmt in &self.fmts {
            write!(f, " {fmt}")?;
        }

        Ok(())
    }
}
