use super::{remove_payload_types, section_at};
use crate::config::CodecRemovalSettings;
use crate::report::Report;
use sdp_lines::{MediaKind, SdpDocument};

/// Inputs of [`apply_removal_policy`]
#[derive(Debug, Clone, Copy)]
pub struct RemovalPolicy<'a> {
    pub settings: &'a CodecRemovalSettings,
    /// Stereo opus is configured
    pub stereo_audio: bool,
    pub mcu_present: bool,
    /// Remove `x-message` rtcp feedback, some peers reject it
    pub strip_x_message_feedback: bool,
}

/// Remove every payload type of `codec` from the sections of `kind`
///
/// Retransmission payload types bound to a removed payload type are removed with it.
/// Returns the number of removed payload types.
pub fn remove_codec(
    doc: &mut SdpDocument,
    kind: MediaKind,
    codec: &str,
    report: &mut Report,
) -> usize {
    let mut removed = 0;

    for section in doc.sections_of(kind) {
        let Some(section) = section_at(doc, section.index) else {
            break;
        };

        let mut payload_types: Vec<u8> = doc
            .rtpmaps(&section)
            .into_iter()
            .filter(|(_, rtpmap)| rtpmap.is(codec))
            .map(|(_, rtpmap)| rtpmap.payload)
            .collect();

        if payload_types.is_empty() {
            continue;
        }

        let rtx: Vec<u8> = doc
            .rtx_bindings(&section)
            .into_iter()
            .filter(|binding| payload_types.contains(&binding.apt))
            .map(|binding| binding.rtx)
            .collect();

        payload_types.extend(rtx);

        log::info!(
            "[{}] Removing {codec} from {kind} section {}, payload types {payload_types:?}",
            report.peer(),
            section.index
        );

        removed += payload_types.len();
        remove_payload_types(doc, &section, &payload_types);
    }

    if removed == 0 {
        report.no_match(format!("Cannot remove {codec}, no {kind} section offers it"));
    }

    removed
}

/// Remove all `a=rtcp-fb` lines announcing the feedback mechanism `feedback`
pub fn remove_rtcp_feedback(doc: &mut SdpDocument, feedback: &str, report: &mut Report) {
    let lines: Vec<usize> = doc
        .sections()
        .iter()
        .flat_map(|section| {
            doc.attributes_matching(section, |name, value| {
                name == "rtcp-fb"
                    && value
                        .and_then(|value| value.split_ascii_whitespace().nth(1))
                        .is_some_and(|typ| typ.eq_ignore_ascii_case(feedback))
            })
        })
        .map(|(index, _)| index)
        .collect();

    if lines.is_empty() {
        return;
    }

    log::info!(
        "[{}] Removing {} {feedback} feedback lines",
        report.peer(),
        lines.len()
    );

    doc.remove_all(&lines);
}

/// Apply the configured removals of codecs and feedback mechanisms
pub fn apply_removal_policy(doc: &mut SdpDocument, policy: &RemovalPolicy<'_>, report: &mut Report) {
    let settings = policy.settings;

    if settings.disable_video_fec {
        if policy.mcu_present {
            report.degraded("Keeping video FEC, the MCU requires it");
        } else {
            remove_codec(doc, MediaKind::Video, "red", report);
            remove_codec(doc, MediaKind::Video, "ulpfec", report);
        }
    }

    if settings.disable_comfort_noise && policy.stereo_audio {
        remove_codec(doc, MediaKind::Audio, "CN", report);
    }

    for (kind, codec) in &settings.codecs {
        remove_codec(doc, *kind, codec, report);
    }

    if settings.disable_remb {
        remove_rtcp_feedback(doc, "goog-remb", report);
    }

    if policy.strip_x_message_feedback {
        remove_rtcp_feedback(doc, "x-message", report);
    }
}
