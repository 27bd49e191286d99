use crate::config::{BundlePolicy, ConnectionSettings, MediaConnection};
use crate::profile::PeerCompatibilityProfile;
use crate::report::Report;
use crate::state::{DirectionRecord, Origin, Step};
use bytesstr::BytesStr;
use sdp_lines::{Direction, Group, MediaKind, MediaSection, SdpDocument, attribute};

/// Decides which media sections are active and in which direction, and applies the bundle policy
///
/// The only transform that writes the negotiation state of a peer.
#[derive(Debug, Clone, Copy)]
pub struct Negotiator<'a> {
    pub connection: &'a ConnectionSettings,
    pub bundle_policy: BundlePolicy,
    pub profile: &'a PeerCompatibilityProfile,
    /// The peer of this negotiation is an MCU
    pub peer_is_mcu: bool,
    /// An MCU takes part in the session
    pub mcu_present: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Keep the section, writing the direction if set
    Enabled(Option<Direction>),
    /// Disabled, but the section carries the bundle transport
    ForcedInactive,
    Delete,
    Reject,
}

impl Negotiator<'_> {
    /// Negotiate all sections of `doc` and store its layout in `record`
    pub fn run(
        &self,
        doc: &mut SdpDocument,
        step: Step,
        record: &mut DirectionRecord,
        report: &mut Report,
    ) {
        let sections = doc.sections();
        let bundle = find_bundle(doc);

        *record = DirectionRecord {
            m_lines: sections
                .iter()
                .map(|section| doc.media_line(section).clone())
                .collect(),
            mids: sections
                .iter()
                .map(|section| doc.mid(section).map(|mid| BytesStr::from(mid.to_owned())))
                .collect(),
            bundle_line: bundle
                .as_ref()
                .and_then(|(index, _)| doc.line(*index))
                .cloned(),
        };

        let bundles_first_section = bundle.as_ref().is_some_and(|(_, group)| {
            match sections.first().and_then(|section| doc.mid(section)) {
                Some(mid) => group.contains(mid),
                None => !group.mids.is_empty(),
            }
        });

        let settings = self.connection_settings();

        let mut decisions = Vec::with_capacity(sections.len());
        let mut mids = vec![];

        for section in &sections {
            let decision = self.decide(doc, section, step, &settings, bundles_first_section, report);

            if matches!(decision, Decision::Enabled(_) | Decision::ForcedInactive) {
                if let Some(mid) = doc.mid(section) {
                    mids.push(BytesStr::from(mid.to_owned()));
                }
            }

            decisions.push(decision);
        }

        // Apply back to front, so the line ranges of the remaining sections stay valid
        for (section, decision) in sections.iter().zip(decisions).rev() {
            apply(doc, section, decision, step, report);
        }

        if let Some((index, group)) = bundle {
            match self.bundle_policy {
                BundlePolicy::Balanced => {}
                BundlePolicy::MaxBundle => {
                    let rewritten = Group::bundle(mids);

                    if rewritten != group {
                        log::info!("[{}] Rewriting bundle group to {rewritten}", report.peer());

                        doc.replace(index, rewritten.to_string());
                    }
                }
                BundlePolicy::None => {
                    log::info!("[{}] Removing bundle group {group}", report.peer());

                    doc.remove(index);
                }
            }
        }

        remove_blank_lines(doc);
    }

    /// Connection settings with the MCU rules applied
    fn connection_settings(&self) -> ConnectionSettings {
        let mut settings = self.connection.clone();

        if self.mcu_present {
            // Media is sent to the MCU and received from everyone else
            for kind in [MediaKind::Audio, MediaKind::Video] {
                if let Some(connection) = settings.get_mut(kind) {
                    connection.send = self.peer_is_mcu;
                    connection.receive = !self.peer_is_mcu;
                }
            }
        }

        settings
    }

    fn decide(
        &self,
        doc: &SdpDocument,
        section: &MediaSection,
        step: Step,
        settings: &ConnectionSettings,
        bundles_first_section: bool,
        report: &mut Report,
    ) -> Decision {
        let kind = section.kind;
        let connection = settings.get(kind);

        let mut enabled = connection.enabled || self.peer_is_mcu;

        if enabled && kind == MediaKind::Video && !self.profile.video_supported {
            report.degraded(format!(
                "Disabling video section {}, the peer requires a video codec the local runtime lacks",
                section.index
            ));

            enabled = false;
        }

        if !enabled {
            if self.bundle_policy == BundlePolicy::MaxBundle
                && bundles_first_section
                && section.index == 0
                && step.is_answering_side()
            {
                report.degraded(format!(
                    "Keeping disabled {kind} section 0 as inactive, it carries the bundle transport"
                ));

                return Decision::ForcedInactive;
            }

            if step.is_fresh_offer() {
                log::debug!(
                    "[{}] Removing disabled {kind} section {}",
                    report.peer(),
                    section.index
                );

                return Decision::Delete;
            }

            log::debug!(
                "[{}] Rejecting disabled {kind} section {}",
                report.peer(),
                section.index
            );

            return Decision::Reject;
        }

        if step.origin == Origin::Remote || !matches!(kind, MediaKind::Audio | MediaKind::Video) {
            return Decision::Enabled(None);
        }

        let original = current_direction(doc, section).map_or(Direction::SendRecv, |(_, d)| d);

        let mut direction = resolve_direction(connection, original);

        if direction == Direction::RecvOnly
            && self.profile.force_sendrecv_for_recvonly_offer
            && step.is_fresh_offer()
            && !self.mcu_present
        {
            report.degraded(format!(
                "Offering {kind} section {} as sendrecv instead of recvonly, the peer fails to bundle recvonly media",
                section.index
            ));

            direction = Direction::SendRecv;
        }

        Decision::Enabled(Some(direction))
    }
}

fn resolve_direction(connection: MediaConnection, original: Direction) -> Direction {
    if connection.send && connection.receive {
        return Direction::SendRecv;
    }

    // A single direction is only kept if the original offered it
    Direction::from_flags(
        connection.send && original.sends(),
        connection.receive && original.receives(),
    )
}

fn apply(
    doc: &mut SdpDocument,
    section: &MediaSection,
    decision: Decision,
    step: Step,
    report: &mut Report,
) {
    // Never touch the trailing terminator
    let end = section.lines.end.min(doc.content_end());

    match decision {
        Decision::Enabled(None) => {}
        Decision::Enabled(Some(direction)) => set_direction(doc, section, end, direction, report),
        Decision::ForcedInactive => {
            if step.origin == Origin::Local {
                set_direction(doc, section, end, Direction::Inactive, report);
            }
        }
        Decision::Delete => {
            let lines: Vec<usize> = (section.lines.start..end).collect();
            doc.remove_all(&lines);
        }
        Decision::Reject => {
            let mut media = section.media.clone();
            media.port = 0;

            let lines: Vec<usize> = (section.lines.start + 1..end).collect();

            doc.set_media_line(section, &media);
            doc.remove_all(&lines);
        }
    }
}

fn set_direction(
    doc: &mut SdpDocument,
    section: &MediaSection,
    end: usize,
    direction: Direction,
    report: &mut Report,
) {
    match current_direction(doc, section) {
        // An inactive section stays inactive
        Some((_, Direction::Inactive)) => {}
        Some((_, current)) if current == direction => {}
        Some((index, current)) => {
            log::info!(
                "[{}] Changing direction of section {} from {} to {}",
                report.peer(),
                section.index,
                current.as_str(),
                direction.as_str()
            );

            doc.replace(index, direction.to_string());
        }
        None if direction == Direction::SendRecv => {}
        None => {
            log::info!(
                "[{}] Setting direction of section {} to {}",
                report.peer(),
                section.index,
                direction.as_str()
            );

            doc.insert(end, direction.to_string());
        }
    }
}

fn current_direction(doc: &SdpDocument, section: &MediaSection) -> Option<(usize, Direction)> {
    section.attribute_range().find_map(|index| {
        let (name, value) = attribute(doc.line(index)?)?;

        if value.is_some() {
            return None;
        }

        Some((index, Direction::from_attribute(name)?))
    })
}

fn find_bundle(doc: &SdpDocument) -> Option<(usize, Group)> {
    doc.session_attributes_matching(|name, _| name == "group")
        .into_iter()
        .find_map(|(index, line)| {
            let (_, value) = attribute(line)?;
            let group = Group::from_value(line, value?.trim_end()).ok()?;

            group.is_bundle().then_some((index, group))
        })
}

/// Remove blank lines, keeping the trailing terminator
fn remove_blank_lines(doc: &mut SdpDocument) {
    let end = doc.content_end();

    doc.retain(|index, line| index >= end || !line.trim().is_empty());
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::NoticeKind;
    use crate::state::SdpType;
    use sdp_lines::MediaKind;

    const OFFER: &str = "v=0\r\n\
o=- 1 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0 1 2\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:0\r\n\
a=sendrecv\r\n\
a=rtpmap:111 opus/48000/2\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:1\r\n\
a=sendrecv\r\n\
a=rtpmap:96 VP8/90000\r\n\
m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:2\r\n\
a=sctp-port:5000\r\n";

    struct Setup {
        connection: ConnectionSettings,
        bundle_policy: BundlePolicy,
        profile: PeerCompatibilityProfile,
        peer_is_mcu: bool,
        mcu_present: bool,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                connection: ConnectionSettings::default(),
                bundle_policy: BundlePolicy::Balanced,
                profile: PeerCompatibilityProfile::default(),
                peer_is_mcu: false,
                mcu_present: false,
            }
        }
    }

    impl Setup {
        fn run(
            &self,
            sdp: &str,
            origin: Origin,
            sdp_type: SdpType,
        ) -> (SdpDocument, DirectionRecord, Report) {
            let mut doc = SdpDocument::parse(&BytesStr::from(sdp.to_owned()));
            let mut record = DirectionRecord::default();
            let mut report = Report::new("peer");

            let negotiator = Negotiator {
                connection: &self.connection,
                bundle_policy: self.bundle_policy,
                profile: &self.profile,
                peer_is_mcu: self.peer_is_mcu,
                mcu_present: self.mcu_present,
            };

            negotiator.run(&mut doc, Step::new(origin, sdp_type), &mut record, &mut report);

            (doc, record, report)
        }
    }

    fn video_disabled() -> Setup {
        let mut setup = Setup::default();
        setup.connection.video.enabled = false;
        setup
    }

    #[test]
    fn defaults_leave_document_untouched() {
        let (doc, record, report) = Setup::default().run(OFFER, Origin::Local, SdpType::Offer);

        assert_eq!(doc.to_string(), OFFER);
        assert_eq!(record.m_lines.len(), 3);
        assert_eq!(record.m_lines[1], "m=video 9 UDP/TLS/RTP/SAVPF 96");
        assert_eq!(record.bundle_line.as_deref(), Some("a=group:BUNDLE 0 1 2"));
        assert!(report.is_empty());
    }

    #[test]
    fn answer_keeps_section_count() {
        for (origin, sdp_type) in [
            (Origin::Local, SdpType::Answer),
            (Origin::Remote, SdpType::Offer),
            (Origin::Remote, SdpType::Answer),
        ] {
            let (doc, _, _) = video_disabled().run(OFFER, origin, sdp_type);

            let sections = doc.sections();
            assert_eq!(sections.len(), 3);

            assert!(sections[1].is_rejected());
            assert_eq!(sections[1].lines.len(), 1);
            assert_eq!(doc.media_line(&sections[1]).as_str(), "m=video 0 UDP/TLS/RTP/SAVPF 96");
            assert!(doc.has_trailing_terminator());
        }
    }

    #[test]
    fn fresh_offer_removes_section() {
        let (doc, record, _) = video_disabled().run(OFFER, Origin::Local, SdpType::Offer);

        let kinds: Vec<MediaKind> = doc.sections().iter().map(|s| s.kind).collect();

        assert_eq!(kinds, [MediaKind::Audio, MediaKind::Data]);
        // the record holds the layout before negotiation
        assert_eq!(record.m_lines.len(), 3);
    }

    #[test]
    fn max_bundle_rewrites_group() {
        let mut setup = video_disabled();
        setup.bundle_policy = BundlePolicy::MaxBundle;

        let (doc, _, _) = setup.run(OFFER, Origin::Local, SdpType::Answer);

        assert_eq!(doc.lines()[4], "a=group:BUNDLE 0 2");
    }

    #[test]
    fn bundle_policy_none_removes_group() {
        let mut setup = Setup::default();
        setup.bundle_policy = BundlePolicy::None;

        let (doc, _, _) = setup.run(OFFER, Origin::Remote, SdpType::Offer);

        assert!(!doc.to_string().contains("a=group"));
        assert_eq!(doc.sections().len(), 3);
    }

    #[test]
    fn bundled_first_section_forced_inactive() {
        let mut setup = Setup::default();
        setup.connection.audio.enabled = false;
        setup.bundle_policy = BundlePolicy::MaxBundle;

        let (doc, _, report) = setup.run(OFFER, Origin::Local, SdpType::Answer);

        let sections = doc.sections();
        assert_eq!(sections.len(), 3);
        assert!(!sections[0].is_rejected());
        assert_eq!(doc.lines()[8], "a=inactive");
        assert_eq!(doc.lines()[4], "a=group:BUNDLE 0 1 2");
        assert!(report.contains(NoticeKind::Degraded));

        // a fresh offer can remove it
        let (doc, _, _) = setup.run(OFFER, Origin::Local, SdpType::Offer);
        assert_eq!(doc.sections()[0].kind, MediaKind::Video);
        assert_eq!(doc.lines()[4], "a=group:BUNDLE 1 2");
    }

    #[test]
    fn directions() {
        let cases = [
            ((true, true), "a=sendrecv", "a=sendrecv"),
            ((true, false), "a=sendrecv", "a=sendonly"),
            ((true, false), "a=recvonly", "a=inactive"),
            ((false, true), "a=sendrecv", "a=recvonly"),
            ((false, true), "a=sendonly", "a=inactive"),
            ((false, false), "a=sendrecv", "a=inactive"),
            ((true, true), "a=inactive", "a=inactive"),
        ];

        for ((send, receive), original, expected) in cases {
            let sdp = format!(
                "v=0\r\nm=audio 9 RTP/AVP 0\r\n{original}\r\na=rtpmap:0 PCMU/8000\r\n"
            );

            let mut setup = Setup::default();
            setup.connection.audio.send = send;
            setup.connection.audio.receive = receive;

            let (doc, _, _) = setup.run(&sdp, Origin::Local, SdpType::Answer);

            assert_eq!(doc.lines()[2], expected, "{send} {receive} {original}");
        }
    }

    #[test]
    fn missing_direction_is_appended() {
        let mut setup = Setup::default();
        setup.connection.audio.send = false;

        let (doc, _, _) = setup.run(
            "v=0\r\nm=audio 9 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\n",
            Origin::Local,
            SdpType::Offer,
        );

        assert_eq!(
            doc.to_string(),
            "v=0\r\nm=audio 9 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\na=recvonly\r\n"
        );
    }

    #[test]
    fn remote_direction_untouched() {
        let mut setup = Setup::default();
        setup.connection.audio.send = false;

        let (doc, _, _) = setup.run(OFFER, Origin::Remote, SdpType::Offer);

        assert_eq!(doc.to_string(), OFFER);
    }

    #[test]
    fn recvonly_offer_to_firefox() {
        let mut setup = Setup::default();
        setup.connection.video.send = false;
        setup.profile.force_sendrecv_for_recvonly_offer = true;

        let (doc, _, report) = setup.run(OFFER, Origin::Local, SdpType::Offer);
        assert_eq!(doc.to_string(), OFFER);
        assert!(report.contains(NoticeKind::Degraded));

        // answers are not affected
        let (doc, _, _) = setup.run(OFFER, Origin::Local, SdpType::Answer);
        assert_eq!(doc.lines()[13], "a=recvonly");
    }

    #[test]
    fn mcu_directions() {
        let mut setup = Setup::default();
        setup.mcu_present = true;

        let (doc, _, _) = setup.run(OFFER, Origin::Local, SdpType::Offer);
        assert_eq!(doc.lines()[8], "a=recvonly");
        assert_eq!(doc.lines()[13], "a=recvonly");

        setup.peer_is_mcu = true;
        setup.connection.video.enabled = false;

        let (doc, _, _) = setup.run(OFFER, Origin::Local, SdpType::Offer);
        assert_eq!(doc.sections().len(), 3);
        assert_eq!(doc.lines()[8], "a=sendonly");
        assert_eq!(doc.lines()[13], "a=sendonly");
    }

    #[test]
    fn unsupported_video() {
        let mut setup = Setup::default();
        setup.profile.video_supported = false;

        let (doc, _, report) = setup.run(OFFER, Origin::Remote, SdpType::Offer);

        assert!(doc.sections()[1].is_rejected());
        assert!(report.contains(NoticeKind::Degraded));
    }

    #[test]
    fn blank_lines_removed() {
        let (doc, _, _) = Setup::default().run(
            "v=0\r\n\r\nm=audio 9 RTP/AVP 0\r\n\r\na=rtpmap:0 PCMU/8000\r\n",
            Origin::Remote,
            SdpType::Answer,
        );

        assert_eq!(
            doc.to_string(),
            "v=0\r\nm=audio 9 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\n"
        );
    }
}
