use sdp_lines::{MediaKind, SdpDocument};
use std::collections::BTreeMap;

/// Media stack implementation of a peer, declared by the peer or known for the local runtime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Agent {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    IE,
    #[default]
    Other,
}

impl Agent {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Agent::Chrome,
            "firefox" => Agent::Firefox,
            "safari" => Agent::Safari,
            "edge" => Agent::Edge,
            "opera" => Agent::Opera,
            "ie" => Agent::IE,
            _ => Agent::Other,
        }
    }
}

/// Clock rate and channel count of a supported codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub clock_rate: u32,
    pub channels: Option<u32>,
}

/// Codecs the local runtime is able to use, as reported by the codec probe
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodecCapabilities {
    audio: BTreeMap<String, CodecInfo>,
    video: BTreeMap<String, CodecInfo>,
}

impl CodecCapabilities {
    /// Collect the rtpmap attributes of the audio and video sections of an offer generated by the local runtime
    pub fn from_offer(offer: &SdpDocument) -> Self {
        let mut capabilities = Self::default();

        for section in offer.sections() {
            if !section.kind.is_rtp() {
                continue;
            }

            for (_, rtpmap) in offer.rtpmaps(&section) {
                capabilities.insert(
                    section.kind,
                    &rtpmap.encoding,
                    CodecInfo {
                        clock_rate: rtpmap.clock_rate,
                        channels: rtpmap.channels,
                    },
                );
            }
        }

        capabilities
    }

    /// Register a codec, names are compared case insensitive. Only audio and video codecs are tracked.
    pub fn insert(&mut self, kind: MediaKind, name: &str, info: CodecInfo) {
        if let Some(codecs) = self.codecs_mut(kind) {
            codecs.insert(name.to_ascii_lowercase(), info);
        }
    }

    pub fn get(&self, kind: MediaKind, name: &str) -> Option<&CodecInfo> {
        self.codecs(kind)?.get(&name.to_ascii_lowercase())
    }

    pub fn supports(&self, kind: MediaKind, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    fn codecs(&self, kind: MediaKind) -> Option<&BTreeMap<String, CodecInfo>> {
        match kind {
            MediaKind::Audio => Some(&self.audio),
            MediaKind::Video => Some(&self.video),
            MediaKind::Data | MediaKind::Other => None,
        }
    }

    fn codecs_mut(&mut self, kind: MediaKind) -> Option<&mut BTreeMap<String, CodecInfo>> {
        match kind {
            MediaKind::Audio => Some(&mut self.audio),
            MediaKind::Video => Some(&mut self.video),
            MediaKind::Data | MediaKind::Other => None,
        }
    }
}

/// Interoperability rules for one pairing of local runtime and remote peer
///
/// Resolved once when the peer is opened and consumed as plain configuration by the transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCompatibilityProfile {
    pub local_agent: Agent,
    pub remote_agent: Agent,

    /// Video can be negotiated with this peer
    ///
    /// False when the pairing requires H264 and the local runtime doesn't support it.
    pub video_supported: bool,

    /// Turn a resolved `recvonly` into `sendrecv` in local offers
    pub force_sendrecv_for_recvonly_offer: bool,

    /// Remove `x-message` rtcp feedback lines
    pub strip_x_message_feedback: bool,

    /// Express bandwidth limits as `b=TIAS` instead of `b=AS`
    pub tias_bandwidth: bool,

    /// Local offers must not end with a line terminator
    pub trim_trailing_blank_line: bool,

    /// Candidates in answers to an MCU must not carry `generation` tokens and use an uppercase transport
    pub normalize_mcu_candidates: bool,
}

impl Default for PeerCompatibilityProfile {
    fn default() -> Self {
        Self::resolve(Agent::Other, Agent::Other, &CodecCapabilities::default())
    }
}

impl PeerCompatibilityProfile {
    pub fn resolve(local: Agent, remote: Agent, capabilities: &CodecCapabilities) -> Self {
        let requires_h264 = (local == Agent::Edge && remote != Agent::Edge)
            || (matches!(local, Agent::Safari | Agent::IE) && remote == Agent::Edge);

        let video_supported = !requires_h264 || capabilities.supports(MediaKind::Video, "h264");

        let profile = Self {
            local_agent: local,
            remote_agent: remote,
            video_supported,
            force_sendrecv_for_recvonly_offer: local != Agent::Firefox && remote == Agent::Firefox,
            strip_x_message_feedback: local == Agent::Edge && remote != Agent::Edge,
            tias_bandwidth: local == Agent::Firefox,
            trim_trailing_blank_line: local == Agent::Edge,
            normalize_mcu_candidates: local == Agent::Firefox,
        };

        log::debug!("Resolved compatibility profile {profile:?}");

        profile
    }
}
