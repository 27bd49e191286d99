use crate::MungeError;
use crate::config::{
    BandwidthSettings, BundlePolicy, FilterSettings, LocalStream, MungeConfig, PeerInfo,
};
use crate::profile::PeerCompatibilityProfile;
use crate::report::Report;
use crate::state::{DirectionRecord, NegotiationContext, Origin, PeerSession, SdpType, Step};
use crate::transform::{
    CandidateFilter, Negotiator, RemovalPolicy, apply_removal_policy, edit_codec_params,
    filter_candidates, filter_dangling_rtx, format_trailing_line, limit_bandwidth,
    normalize_mcu_candidates, prefer_codec, reconcile, signal_end_of_candidates,
};
use bytesstr::BytesStr;
use sdp_lines::{MediaKind, SdpDocument};

/// Result of a single negotiation step
#[derive(Debug, Clone)]
pub struct Munged {
    /// The rewritten document
    pub sdp: String,
    pub report: Report,
}

/// Runs the transforms of a negotiation step in their fixed order
///
/// Local descriptions pass codec removal, rtx filter, codec preference, codec parameters, negotiator, reconciler,
/// bandwidth, candidate filters and trailing line formatting.
///
/// Remote descriptions pass negotiator, rtx filter, bandwidth, candidate filters and trailing line formatting.
///
/// The negotiation state of a peer is only updated when a step succeeds.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: MungeConfig,
}

/// Session wide settings with the peer's overrides applied
struct PeerSettings {
    bandwidth: BandwidthSettings,
    filter: FilterSettings,
    bundle_policy: BundlePolicy,
}

impl Pipeline {
    pub fn new(config: MungeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MungeConfig {
        &self.config
    }

    /// Resolve the compatibility profile of a peer and create its negotiation state
    pub fn open_peer<'c>(
        &self,
        ctx: &'c mut NegotiationContext,
        peer_id: impl Into<String>,
        info: PeerInfo,
    ) -> &'c mut PeerSession {
        let profile =
            PeerCompatibilityProfile::resolve(self.config.local_agent, info.agent, ctx.capabilities());

        ctx.open_peer(peer_id, info, profile)
    }

    /// Discard the negotiation state of a peer, returns false if it wasn't open
    pub fn close_peer(&self, ctx: &mut NegotiationContext, peer_id: &str) -> bool {
        ctx.close_peer(peer_id).is_some()
    }

    /// Rewrite a description generated by the local media stack before it is applied and sent to the peer
    pub fn process_local(
        &self,
        ctx: &mut NegotiationContext,
        peer_id: &str,
        sdp_type: SdpType,
        sdp: &BytesStr,
        streams: &[LocalStream],
    ) -> Result<Munged, MungeError> {
        let session = peer_mut(ctx, peer_id)?;
        let config = &self.config;
        let settings = self.peer_settings(&session.info);
        let step = Step::new(Origin::Local, sdp_type);

        log::debug!("[{peer_id}] Processing local {sdp_type}");

        let mut doc = SdpDocument::parse(sdp);
        let mut report = Report::new(peer_id);

        apply_removal_policy(
            &mut doc,
            &RemovalPolicy {
                settings: &config.codec_removal,
                stereo_audio: config.codec_params.opus.stereo == Some(true),
                mcu_present: config.mcu_present,
                strip_x_message_feedback: session.profile.strip_x_message_feedback,
            },
            &mut report,
        );

        filter_dangling_rtx(&mut doc, &mut report);

        prefer_codec(
            &mut doc,
            MediaKind::Audio,
            &config.codec_preference.audio,
            &mut report,
        );
        prefer_codec(
            &mut doc,
            MediaKind::Video,
            &config.codec_preference.video,
            &mut report,
        );

        for edit in config.codec_params.edits() {
            edit_codec_params(&mut doc, &edit, &mut report);
        }

        let mut record = DirectionRecord::default();

        self.negotiator(&session.profile, &session.info, &settings)
            .run(&mut doc, step, &mut record, &mut report);

        reconcile(
            &mut doc,
            sdp_type,
            streams,
            &session.state.remote,
            settings.bundle_policy,
            &mut report,
        )?;

        limit_bandwidth(
            &mut doc,
            &settings.bandwidth,
            session.profile.tias_bandwidth,
            &mut report,
        );

        self.apply_candidate_policy(&mut doc, session, &settings, &mut report);

        if session.profile.normalize_mcu_candidates
            && session.info.is_mcu
            && sdp_type == SdpType::Answer
        {
            normalize_mcu_candidates(&mut doc, &mut report);
        }

        format_trailing_line(&mut doc, step, &session.profile);

        session.state.local = record;

        Ok(finish(doc, report, step))
    }

    /// Rewrite a description received from the peer before it is applied as remote description
    pub fn process_remote(
        &self,
        ctx: &mut NegotiationContext,
        peer_id: &str,
        sdp_type: SdpType,
        sdp: &BytesStr,
    ) -> Result<Munged, MungeError> {
        let session = peer_mut(ctx, peer_id)?;
        let settings = self.peer_settings(&session.info);
        let step = Step::new(Origin::Remote, sdp_type);

        log::debug!("[{peer_id}] Processing remote {sdp_type}");

        let mut doc = SdpDocument::parse(sdp);
        let mut report = Report::new(peer_id);

        self.negotiator(&session.profile, &session.info, &settings).run(
            &mut doc,
            step,
            &mut session.state.remote,
            &mut report,
        );

        filter_dangling_rtx(&mut doc, &mut report);

        limit_bandwidth(
            &mut doc,
            &settings.bandwidth,
            session.profile.tias_bandwidth,
            &mut report,
        );

        self.apply_candidate_policy(&mut doc, session, &settings, &mut report);

        format_trailing_line(&mut doc, step, &session.profile);

        Ok(finish(doc, report, step))
    }

    /// Check a single trickled candidate line against the candidate filter of the peer
    pub fn allows_candidate(
        &self,
        ctx: &NegotiationContext,
        peer_id: &str,
        line: &str,
    ) -> Result<bool, MungeError> {
        let session = ctx.peer(peer_id).ok_or_else(|| MungeError::UnknownPeer {
            peer: peer_id.into(),
        })?;

        let settings = self.peer_settings(&session.info);

        Ok(CandidateFilter::new(&settings.filter, self.config.mcu_present).allows(line))
    }

    fn peer_settings(&self, info: &PeerInfo) -> PeerSettings {
        let overrides = &info.overrides;

        PeerSettings {
            bandwidth: match &overrides.bandwidth {
                Some(bandwidth) => self.config.bandwidth.merged(bandwidth),
                None => self.config.bandwidth.clone(),
            },
            filter: overrides.filter.unwrap_or(self.config.filter),
            bundle_policy: overrides.bundle_policy.unwrap_or(self.config.bundle_policy),
        }
    }

    fn negotiator<'a>(
        &'a self,
        profile: &'a PeerCompatibilityProfile,
        info: &PeerInfo,
        settings: &PeerSettings,
    ) -> Negotiator<'a> {
        Negotiator {
            connection: &self.config.connection,
            bundle_policy: settings.bundle_policy,
            profile,
            peer_is_mcu: info.is_mcu,
            mcu_present: self.config.mcu_present,
        }
    }

    fn apply_candidate_policy(
        &self,
        doc: &mut SdpDocument,
        session: &PeerSession,
        settings: &PeerSettings,
        report: &mut Report,
    ) {
        let filter = CandidateFilter::new(&settings.filter, self.config.mcu_present);

        filter_candidates(doc, &filter, report);

        if !session.info.trickle_ice {
            signal_end_of_candidates(doc, report);
        }
    }
}

fn peer_mut<'c>(
    ctx: &'c mut NegotiationContext,
    peer_id: &str,
) -> Result<&'c mut PeerSession, MungeError> {
    ctx.peer_mut(peer_id).ok_or_else(|| MungeError::UnknownPeer {
        peer: peer_id.into(),
    })
}

fn finish(doc: SdpDocument, report: Report, step: Step) -> Munged {
    if !report.is_empty() {
        log::info!(
            "[{}] Processed {:?} {} with {} notices",
            report.peer(),
            step.origin,
            step.sdp_type,
            report.notices().len()
        );
    }

    Munged {
        sdp: doc.to_string(),
        report,
    }
}
