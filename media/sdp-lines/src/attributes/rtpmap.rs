//! RtpMap attribute (`a=rtpmap:...`)

use crate::parse::{IResult, ParseLineError, finish, number, slash_num};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, space1};
use nom::combinator::{map, opt};
use nom::error::context;
use nom::sequence::{preceded, terminated, tuple};
use std::fmt;

/// Rtpmap attribute (`a=rtpmap`)
///
/// Maps a RTP payload number listed in the media field to an encoding.
/// This is what identifies a codec inside a media section.
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-6.6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    /// The number used in the media field which this maps a description to
    pub payload: u8,

    /// Name of the encoding
    pub encoding: BytesStr,

    /// Clock rate of the encoding
    pub clock_rate: u32,

    /// Number of audio channels, if specified
    pub channels: Option<u32>,
}

impl RtpMap {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing rtpmap",
            map(
                tuple((
                    // payload num
                    number::<u8>,
                    // encoding
                    preceded(
                        space1,
                        terminated(take_while1(|c: char| c != '/' && !c.is_whitespace()), char('/')),
                    ),
                    // clock rate
                    number::<u32>,
                    // optional channels
                    opt(slash_num),
                )),
                |(payload, encoding, clock_rate, channels)| RtpMap {
                    payload,
                    encoding: BytesStr::from_parse(src, encoding),
                    clock_rate,
                    channels,
                },
            ),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("rtpmap", value, |i| Self::parse(line.as_ref(), i))
    }

    /// Channel count, a missing count means mono
    pub fn channel_count(&self) -> u32 {
        self.channels.unwrap_or(1)
    }

    /// Case insensitive comparison of the encoding name
    pub fn is(&self, encoding: &str) -> bool {
        self.encoding.eq_ignore_ascii_case(encoding)
    }

    /// Returns if this maps a retransmission payload type
    pub fn is_rtx(&self) -> bool {
        self.is("rtx")
    }
}

impl fmt::Display for RtpMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a=rtpmap:{} {}/{}", self.payload, self.encoding, self.clock_rate)?;

        if let Some(channels) = self.channels {
            write!(f, "/{channels}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rtpmap() {
        let input = BytesStr::from_static("0 PCMU/8000");

        let (rem, rtpmap) = RtpMap::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(rtpmap.payload, 0);
        assert_eq!(rtpmap.encoding, "PCMU");
        assert_eq!(rtpmap.clock_rate, 8000);
        assert_eq!(rtpmap.channels, None);
        assert_eq!(rtpmap.channel_count(), 1);
    }

    #[test]
    fn rtpmap_channels() {
        let input = BytesStr::from_static("111 opus/48000/2");

        let (rem, rtpmap) = RtpMap::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(rtpmap.payload, 111);
        assert!(rtpmap.is("OPUS"));
        assert_eq!(rtpmap.clock_rate, 48000);
        assert_eq!(rtpmap.channels, Some(2));
    }

    #[test]
    fn rtpmap_print() {
        let rtpmap = RtpMap {
            payload: 97,
            encoding: "rtx".into(),
            clock_rate: 90000,
            channels: None,
        };

        assert!(rtpmap.is_rtx());
        assert_eq!(rtpmap.to_string(), "a=rtpmap:97 rtx/90000");
    }
}
