//! Format parameters attribute (`a=fmtp:...`)

use crate::parse::{IResult, ParseLineError, finish, number};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::character::complete::space0;
use nom::combinator::{map, rest};
use nom::error::context;
use nom::sequence::{preceded, tuple};
use std::fmt;

/// Specify additional parameters for a format specified by a `rtpmap`
///
/// Media-Level attribute
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-6.15)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fmtp {
    /// The format the parameter is for
    pub format: u8,

    /// The parameters as string
    pub params: BytesStr,
}

impl Fmtp {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing fmtp",
            map(
                tuple((number::<u8>, preceded(space0, rest))),
                |(format, params): (u8, &str)| Fmtp {
                    format,
                    params: BytesStr::from_parse(src, params.trim_end()),
                },
            ),
        )(i)
    }

    /// Parse the attribute value of the `line`
    pub fn from_value(line: &BytesStr, value: &str) -> Result<Self, ParseLineError> {
        finish("fmtp", value, |i| Self::parse(line.as_ref(), i))
    }

    pub fn params(&self) -> FmtpParams {
        FmtpParams::parse(&self.params)
    }
}

impl fmt::Display for Fmtp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a=fmtp:{} {}", self.format, self.params)
    }
}

/// Ordered `key[=value]` list of a fmtp attribute
///
/// Keys keep the order they were parsed or inserted in. Parameters which are not changed are written back as they were
/// parsed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FmtpParams {
    params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    key: String,
    value: Option<String>,
    /// Source text, `None` once the value changed
    raw: Option<String>,
}

impl FmtpParams {
    pub fn parse(i: &str) -> Self {
        let params = i
            .split(';')
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                let (key, value) = match raw.split_once('=') {
                    Some((key, value)) => (key.trim(), Some(value.trim().to_owned())),
                    None => (raw.trim(), None),
                };

                Param {
                    key: key.to_owned(),
                    value,
                    raw: Some(raw.to_owned()),
                }
            })
            .collect();

        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.iter().any(|param| param.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .and_then(|param| param.value.as_deref())
    }

    /// Overwrite the value of `key` in place, or append it if it doesn't exist yet
    pub fn set(&mut self, key: &str, value: Option<String>) {
        if let Some(param) = self.params.iter_mut().find(|param| param.key == key) {
            if param.value != value {
                param.value = value;
                param.raw = None;
            }
        } else {
            self.params.push(Param {
                key: key.to_owned(),
                value,
                raw: None,
            });
        }
    }

    /// Remove `key`, returns if it was present
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|param| param.key != key);
        before != self.params.len()
    }

    /// The associated payload type of a retransmission format (`apt=`)
    pub fn apt(&self) -> Option<u8> {
        self.get("apt")?.parse().ok()
    }
}

impl fmt::Display for FmtpParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }

            if let Some(raw) = &param.raw {
                f.write_str(if i == 0 { raw.trim_start() } else { raw })?;
                continue;
            }

            f.write_str(&param.key)?;

            if let Some(value) = &param.value {
                write!(f, "={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fmtp() {
        let input = BytesStr::from_static("111 minptime=10;useinbandfec=1");

        let (rem, fmtp) = Fmtp::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(fmtp.format, 111);
        assert_eq!(fmtp.params, "minptime=10;useinbandfec=1");
    }

    #[test]
    fn fmtp_print() {
        let fmtp = Fmtp {
            format: 111,
            params: "some=param".into(),
        };

        assert_eq!(fmtp.to_string(), "a=fmtp:111 some=param");
    }

    #[test]
    fn params() {
        let mut params = FmtpParams::parse("minptime=10; useinbandfec=1;;flag");

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("minptime"), Some("10"));
        assert!(params.contains("flag"));
        assert_eq!(params.get("flag"), None);

        params.set("minptime", Some("20".into()));
        params.set("stereo", Some("1".into()));
        assert!(params.remove("useinbandfec"));

        assert_eq!(params.to_string(), "minptime=20;flag;stereo=1");
    }

    #[test]
    fn untouched_params_keep_their_text() {
        let mut params = FmtpParams::parse("minptime=10; useinbandfec=1");

        assert_eq!(params.get("useinbandfec"), Some("1"));

        params.set("useinbandfec", Some("1".into()));
        params.set("stereo", Some("1".into()));

        assert_eq!(params.to_string(), "minptime=10; useinbandfec=1;stereo=1");
    }

    #[test]
    fn apt() {
        let params = FmtpParams::parse("apt=96");

        assert_eq!(params.apt(), Some(96));
        assert_eq!(FmtpParams::parse("x=1").apt(), None);
    }
}
