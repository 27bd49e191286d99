mod candidate;
mod direction;
mod fingerprint;
mod fmtp;
mod group;
mod rtpmap;
mod ssrc;

pub use candidate::{Candidate, CandidateType};
pub use direction::Direction;
pub use fingerprint::{Fingerprint, FingerprintAlgorithm};
pub use fmtp::{Fmtp, FmtpParams};
pub use group::Group;
pub use rtpmap::RtpMap;
pub use ssrc::{SourceAttribute, Ssrc};

/// Split an attribute line (`a=name[:value]`) into its name and optional value
///
/// Returns `None` for lines that are not attributes.
pub fn attribute(line: &str) -> Option<(&str, Option<&str>)> {
    let attr = line.strip_prefix("a=")?;

    match attr.split_once(':') {
        Some((name, value)) => Some((name, Some(value))),
        None => Some((attr.trim_end(), None)),
    }
}
