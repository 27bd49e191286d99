use crate::config::PeerInfo;
use crate::profile::{CodecCapabilities, PeerCompatibilityProfile};
use bytesstr::BytesStr;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Which side produced the document being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Generated by the local media stack, about to be applied and sent to the peer
    Local,
    /// Received from the peer
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdpType {
    Offer,
    Answer,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdpType::Offer => f.write_str("offer"),
            SdpType::Answer => f.write_str("answer"),
        }
    }
}

/// Identifies a single negotiation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub origin: Origin,
    pub sdp_type: SdpType,
}

impl Step {
    pub fn new(origin: Origin, sdp_type: SdpType) -> Self {
        Self { origin, sdp_type }
    }

    /// A local offer generated from scratch, media may be removed instead of rejected
    pub fn is_fresh_offer(&self) -> bool {
        self.origin == Origin::Local && self.sdp_type == SdpType::Offer
    }

    /// The document answers an offer made by the peer
    pub fn is_answering_side(&self) -> bool {
        match self.origin {
            Origin::Local => self.sdp_type == SdpType::Answer,
            Origin::Remote => self.sdp_type == SdpType::Offer,
        }
    }
}

/// Snapshot of the last document processed for one origin
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectionRecord {
    /// Raw `m=` lines by section position
    pub m_lines: Vec<BytesStr>,
    /// `a=mid` of each section by position
    pub mids: Vec<Option<BytesStr>>,
    /// Raw `a=group:BUNDLE` line
    pub bundle_line: Option<BytesStr>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NegotiationState {
    pub local: DirectionRecord,
    pub remote: DirectionRecord,
}

/// Everything known about an open peer
#[derive(Debug, Clone)]
pub struct PeerSession {
    pub info: PeerInfo,
    pub profile: PeerCompatibilityProfile,
    pub state: NegotiationState,
}

/// Caller owned negotiation state of all peers, keyed by peer id
#[derive(Debug, Default)]
pub struct NegotiationContext {
    capabilities: CodecCapabilities,
    peers: HashMap<String, PeerSession>,
}

impl NegotiationContext {
    pub fn new(capabilities: CodecCapabilities) -> Self {
        Self {
            capabilities,
            peers: HashMap::new(),
        }
    }

    pub fn capabilities(&self) -> &CodecCapabilities {
        &self.capabilities
    }

    /// Create fresh state for a peer, replacing any previous state of the same id
    pub fn open_peer(
        &mut self,
        peer_id: impl Into<String>,
        info: PeerInfo,
        profile: PeerCompatibilityProfile,
    ) -> &mut PeerSession {
        let peer_id = peer_id.into();

        log::debug!("[{peer_id}] Opening negotiation state");

        let session = PeerSession {
            info,
            profile,
            state: NegotiationState::default(),
        };

        match self.peers.entry(peer_id) {
            Entry::Occupied(mut entry) => {
                entry.insert(session);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(session),
        }
    }

    /// Discard the state of a peer
    pub fn close_peer(&mut self, peer_id: &str) -> Option<PeerSession> {
        log::debug!("[{peer_id}] Closing negotiation state");

        self.peers.remove(peer_id)
    }

    pub fn peer(&self, peer_id: &str) -> Option<&PeerSession> {
        self.peers.get(peer_id)
    }

    pub fn peer_mut(&mut self, peer_id: &str) -> Option<&mut PeerSession> {
        self.peers.get_mut(peer_id)
    }

    pub fn state(&self, peer_id: &str) -> Option<&NegotiationState> {
        self.peers.get(peer_id).map(|peer| &peer.state)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn answering_side() {
        assert!(Step::new(Origin::Remote, SdpType::Offer).is_answering_side());
        assert!(Step::new(Origin::Local, SdpType::Answer).is_answering_side());
        assert!(!Step::new(Origin::Local, SdpType::Offer).is_answering_side());
        assert!(!Step::new(Origin::Remote, SdpType::Answer).is_answering_side());

        assert!(Step::new(Origin::Local, SdpType::Offer).is_fresh_offer());
        assert!(!Step::new(Origin::Remote, SdpType::Offer).is_fresh_offer());
    }

    #[test]
    fn peer_lifecycle() {
        let mut ctx = NegotiationContext::default();

        let peer = ctx.open_peer("a", PeerInfo::default(), PeerCompatibilityProfile::default());
        peer.state.remote.m_lines.push("m=audio 9 RTP/AVP 0".into());

        assert_eq!(ctx.state("a").unwrap().remote.m_lines.len(), 1);

        // reopening starts over
        ctx.open_peer("a", PeerInfo::default(), PeerCompatibilityProfile::default());
        assert!(ctx.state("a").unwrap().remote.m_lines.is_empty());

        assert!(ctx.close_peer("a").is_some());
        assert!(ctx.peer("a").is_none());
        assert!(ctx.close_peer("a").is_none());
    }
}
