use super::section_at;
use crate::MungeError;
use crate::config::{BundlePolicy, LocalStream};
use crate::profile::PeerCompatibilityProfile;
use crate::report::Report;
use crate::state::{DirectionRecord, SdpType, Step};
use bytesstr::BytesStr;
use sdp_lines::{Group, MediaKind, MediaLine, SdpDocument, SourceAttribute, Ssrc, attribute};

/// Align the local document with the attached tracks and the layout of the remote offer
///
/// Track identifiers are written for the n-th track of a kind into the n-th section of that kind.
/// Answers additionally get zero port sections wherever the remote offer had a section the answer lacks.
///
/// Fails with [`MungeError::InconsistentState`] if the answer still differs from the recorded offer afterwards.
pub fn reconcile(
    doc: &mut SdpDocument,
    sdp_type: SdpType,
    streams: &[LocalStream],
    remote: &DirectionRecord,
    bundle_policy: BundlePolicy,
    report: &mut Report,
) -> Result<(), MungeError> {
    for kind in [MediaKind::Audio, MediaKind::Video] {
        let tracks = streams.iter().flat_map(|stream| {
            stream
                .tracks
                .iter()
                .filter(move |track| track.kind == kind)
                .map(move |track| (stream.id.as_str(), track.id.as_str()))
        });

        for (position, (stream, track)) in tracks.enumerate() {
            annotate_track(doc, kind, position, stream, track, report);
        }
    }

    if sdp_type != SdpType::Answer || remote.m_lines.is_empty() {
        return Ok(());
    }

    restore_sections(doc, remote, report);

    if bundle_policy == BundlePolicy::MaxBundle {
        restore_bundle_line(doc, remote, report);
    }

    check_layout(doc, remote, report)
}

/// Write `msid`, `mslabel` and `label` of a track after the cname line of its section
fn annotate_track(
    doc: &mut SdpDocument,
    kind: MediaKind,
    position: usize,
    stream: &str,
    track: &str,
    report: &mut Report,
) {
    let Some(section) = doc.sections_of(kind).into_iter().nth(position) else {
        report.missing_structure(format!(
            "Cannot identify track {track}, there is no {kind} section for it"
        ));
        return;
    };

    let Some((index, ssrc)) = doc.ssrcs(&section).into_iter().next() else {
        log::debug!(
            "[{}] {kind} section {} has no ssrc to identify track {track}",
            report.peer(),
            section.index
        );
        return;
    };

    if !ssrc.is_cname() {
        log::debug!(
            "[{}] Removing stale ssrc line of {kind} section {}",
            report.peer(),
            section.index
        );

        doc.remove(index);
        return;
    }

    let stale: Vec<usize> = doc
        .ssrcs(&section)
        .into_iter()
        .filter(|(_, other)| other.ssrc == ssrc.ssrc && is_track_identifier(other))
        .map(|(index, _)| index)
        .collect();

    let cname_line = index - stale.iter().filter(|&&stale| stale < index).count();

    doc.remove_all(&stale);

    log::info!(
        "[{}] Identifying ssrc {} of {kind} section {} as track {track} of stream {stream}",
        report.peer(),
        ssrc.ssrc,
        section.index
    );

    let lines = [
        format!("a=ssrc:{} msid:{stream} {track}", ssrc.ssrc),
        format!("a=ssrc:{} mslabel:{stream}", ssrc.ssrc),
        format!("a=ssrc:{} label:{track}", ssrc.ssrc),
    ];

    for (offset, line) in lines.into_iter().enumerate() {
        doc.insert(cname_line + 1 + offset, line);
    }
}

fn is_track_identifier(ssrc: &Ssrc) -> bool {
    match &ssrc.attribute {
        SourceAttribute::Msid { .. } => true,
        SourceAttribute::Other { name, .. } => {
            name.as_str() == "mslabel" || name.as_str() == "label"
        }
        SourceAttribute::CName { .. } => false,
    }
}

/// Replace the bundle group with the one of the offer, without the mids of sections the answer rejects
fn restore_bundle_line(doc: &mut SdpDocument, remote: &DirectionRecord, report: &mut Report) {
    let Some(recorded) = &remote.bundle_line else {
        return;
    };

    let Some(mut group) = attribute(recorded)
        .and_then(|(_, value)| Group::from_value(recorded, value?.trim_end()).ok())
    else {
        report.missing_structure(format!("Cannot restore malformed bundle group {recorded}"));
        return;
    };

    let current = doc
        .session_attributes_matching(|name, value| {
            name == "group" && value.is_some_and(|value| value.starts_with("BUNDLE"))
        })
        .into_iter()
        .next()
        .map(|(index, _)| index);

    let Some(index) = current else {
        return;
    };

    let rejected: Vec<&str> = doc
        .sections()
        .iter()
        .filter(|section| section.is_rejected())
        .filter_map(|section| remote.mids.get(section.index)?.as_deref())
        .collect();

    let before = group.mids.len();
    group.mids.retain(|mid| !rejected.contains(&mid.as_str()));

    if group.mids.len() == before {
        log::debug!("[{}] Restoring bundle group {recorded}", report.peer());

        doc.replace(index, recorded.clone());
    } else {
        log::debug!(
            "[{}] Restoring bundle group {group}, rejected sections removed",
            report.peer()
        );

        doc.replace(index, group.to_string());
    }
}

/// Insert or append zero port sections for every recorded section the document lacks
fn restore_sections(doc: &mut SdpDocument, remote: &DirectionRecord, report: &mut Report) {
    for (position, recorded) in remote.m_lines.iter().enumerate() {
        let Some(section) = section_at(doc, position) else {
            log::info!(
                "[{}] Appending rejected section {position} for {recorded}",
                report.peer()
            );

            doc.push_line(placeholder(recorded));
            continue;
        };

        let recorded_media = MediaLine::parse_lenient(recorded);

        if recorded_media.media.eq_ignore_ascii_case(&section.media.media) {
            continue;
        }

        log::info!(
            "[{}] Inserting rejected section {position} for {recorded}, the answer has {} there",
            report.peer(),
            section.media.media
        );

        doc.insert(section.lines.start, placeholder(recorded));
    }
}

/// The recorded `m=` line with port 0
fn placeholder(recorded: &BytesStr) -> String {
    let mut media = MediaLine::parse_lenient(recorded);
    media.port = 0;
    media.to_string()
}

fn check_layout(
    doc: &SdpDocument,
    remote: &DirectionRecord,
    report: &Report,
) -> Result<(), MungeError> {
    let sections = doc.sections();

    if sections.len() != remote.m_lines.len() {
        return Err(MungeError::InconsistentState {
            peer: report.peer().into(),
            reason: format!(
                "answer has {} media sections, the offer had {}",
                sections.len(),
                remote.m_lines.len()
            ),
        });
    }

    for (section, recorded) in sections.iter().zip(&remote.m_lines) {
        let recorded = MediaLine::parse_lenient(recorded);

        if !recorded.media.eq_ignore_ascii_case(&section.media.media) {
            return Err(MungeError::InconsistentState {
                peer: report.peer().into(),
                reason: format!(
                    "answer section {} is {}, the offer had {}",
                    section.index, section.media.media, recorded.media
                ),
            });
        }
    }

    Ok(())
}

/// Terminate the document with a line break, unless the local runtime rejects it
pub fn format_trailing_line(doc: &mut SdpDocument, step: Step, profile: &PeerCompatibilityProfile) {
    let terminate = !(profile.trim_trailing_blank_line && step.is_fresh_offer());

    if doc.has_trailing_terminator() != terminate {
        doc.set_trailing_terminator(terminate);
    }
}
