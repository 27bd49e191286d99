#![warn(unreachable_pub)]

mod attributes;
mod document;
mod media_line;
mod parse;
mod section;

pub use attributes::{
    Candidate, CandidateType, Direction, Fingerprint, FingerprintAlgorithm, Fmtp, FmtpParams,
    Group, RtpMap, SourceAttribute, Ssrc, attribute,
};
pub use document::{LineEnding, SdpDocument};
pub use media_line::{MediaKind, MediaLine};
pub use parse::{IResult, ParseLineError};
pub use section::{MediaSection, RtxBinding};
