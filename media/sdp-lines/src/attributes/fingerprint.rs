//! DTLS fingerprint attribute (`a=fingerprint:...`)

use crate::parse::{IResult, ParseLineError, finish, spaced_token, token};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::combinator::map;
use nom::error::context;
use nom::sequence::tuple;
use std::fmt;

/// Certificate fingerprint used by DTLS, the value is kept as written
///
/// [RFC8122](https://www.rfc-editor.org/rfc/rfc8122.html#section-5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub algorithm: FingerprintAlgorithm,
    pub value: BytesStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintAlgorithm {
    SHA1,
    SHA224,
    SHA256,
    SHA384,
    SHA512,
    MD5,
    MD2,
    Other(BytesStr),
}

impl FingerprintAlgorithm {
    fn from_token(src: &Bytes, token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "SHA-1" => FingerprintAlgorithm::SHA1,
            "SHA-224" => FingerprintAlgorithm::SHA224,
            "SHA-256" => FingerprintAlgorithm::SHA256,
            "SHA-384" => FingerprintAlgorithm::SHA384,
            "SHA-512" => FingerprintAlgorithm::SHA512,
            "MD5" => FingerprintAlgorithm::MD5,
            "MD2" => FingerprintAlgorithm::MD2,
            _ => FingerprintAlgorithm::Other(BytesStr::from_parse(src, token)),
        }
    }
}

impl Fingerprint {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing fingerprint-attribute",
            map(tuple((token, spaced_token)), |(algorithm, value)| Self {
                algorithm: FingerprintAlgorithm::from_token(src, algorithm),
                value: BytesStr::from_parse(src, value),
            }),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("fingerprint", value, |i| Self::parse(line.as_ref(), i))
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FingerprintAlgorithm::SHA1 => "sha-1",
            FingerprintAlgorithm::SHA224 => "sha-224",
            FingerprintAlgorithm::SHA256 => "sha-256",
            FingerprintAlgorithm::SHA384 => "sha-384",
            FingerprintAlgorithm::SHA512 => "sha-512",
            FingerprintAlgorithm::MD5 => "md5",
            FingerprintAlgorithm::MD2 => "md2",
            FingerprintAlgorithm::Other(bytes_str) => bytes_str.as_str(),
        })
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a=fingerprint:{} {}", self.algorithm, self.value)
    }
}
