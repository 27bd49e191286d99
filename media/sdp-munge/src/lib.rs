//! # SDP offer/answer rewriting
//!
//! The SDP generated or received by a WebRTC media stack is only a starting point. This crate rewrites it before it
//! is applied: codecs are removed, reordered and tuned, bandwidth is limited, media directions and the bundle group
//! follow the configured [`ConnectionSettings`], candidates are filtered and interoperability quirks of the peer's
//! implementation are worked around.
//!
//! [`Pipeline`] is the entry point. It runs the transforms found in the [`transform`] module in a fixed order and keeps
//! the per-peer negotiation state in a caller owned [`NegotiationContext`], which is required to keep answers
//! positionally aligned with the offers they answer.
//!
//! ```
//! use ezk_sdp_munge::{MungeConfig, NegotiationContext, PeerInfo, Pipeline, SdpType};
//! use bytesstr::BytesStr;
//!
//! let pipeline = Pipeline::new(MungeConfig::default());
//! let mut ctx = NegotiationContext::default();
//!
//! pipeline.open_peer(&mut ctx, "alice", PeerInfo::default());
//!
//! let offer = BytesStr::from_static("v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=audio 9 RTP/AVP 0\r\n");
//! let munged = pipeline
//!     .process_remote(&mut ctx, "alice", SdpType::Offer, &offer)
//!     .unwrap();
//!
//! assert_eq!(munged.sdp, offer.as_str());
//! ```

#![warn(unreachable_pub)]

mod config;
mod metadata;
mod pipeline;
mod profile;
mod report;
mod state;
pub mod transform;

pub use config::{
    BandwidthSettings, BundlePolicy, CodecParamEdit, CodecParamsSettings, CodecPreference,
    CodecPreferences, CodecRemovalSettings, ConnectionSettings, FilterSettings, H264Params,
    LocalStream, LocalTrack, MediaConnection, MungeConfig, OpusParams, ParamValue, PeerInfo,
    PeerOverrides, VpxParams,
};
pub use metadata::{SelectedCodec, fingerprint, selected_codec};
pub use pipeline::{Munged, Pipeline};
pub use profile::{Agent, CodecCapabilities, CodecInfo, PeerCompatibilityProfile};
pub use report::{Notice, NoticeKind, Report};
pub use sdp_lines::{Fingerprint, FingerprintAlgorithm, MediaKind, SdpDocument};
pub use state::{
    DirectionRecord, NegotiationContext, NegotiationState, Origin, PeerSession, SdpType, Step,
};

#[derive(Debug, thiserror::Error)]
pub enum MungeError {
    #[error("No negotiation state for peer {peer}, it must be opened first")]
    UnknownPeer { peer: String },
    #[error("Negotiation state of peer {peer} does not match the document: {reason}")]
    InconsistentState { peer: String, reason: String },
}
