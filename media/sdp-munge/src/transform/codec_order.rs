use super::section_at;
use crate::config::CodecPreference;
use crate::report::Report;
use sdp_lines::{MediaKind, RtpMap, SdpDocument};

/// Move the payload types of the preferred codec to the front of every `m=` line of `kind`
///
/// Matching uses the most specific tier that yields a payload type:
/// name, clock rate and channels > name and clock rate > name and channels > name.
pub fn prefer_codec(
    doc: &mut SdpDocument,
    kind: MediaKind,
    preference: &CodecPreference,
    report: &mut Report,
) {
    let CodecPreference::Codec {
        codec,
        sampling_rate,
        channels,
    } = preference
    else {
        log::debug!(
            "[{}] No {kind} codec preference, keeping the media stack's order",
            report.peer()
        );
        return;
    };

    let sections = doc.sections_of(kind);

    if sections.is_empty() {
        report.missing_structure(format!(
            "Cannot prefer {codec} for {kind}, there is no {kind} section"
        ));
        return;
    }

    for section in sections {
        let Some(section) = section_at(doc, section.index) else {
            break;
        };

        let rtpmaps: Vec<RtpMap> = doc
            .rtpmaps(&section)
            .into_iter()
            .map(|(_, rtpmap)| rtpmap)
            .collect();

        let name = |rtpmap: &RtpMap| rtpmap.is(codec);
        let rate = |rtpmap: &RtpMap| sampling_rate.is_some_and(|rate| rate == rtpmap.clock_rate);
        let chans = |rtpmap: &RtpMap| channels.is_some_and(|c| c == rtpmap.channel_count());

        let tiers: [&dyn Fn(&RtpMap) -> bool; 4] = [
            &|r: &RtpMap| name(r) && rate(r) && chans(r),
            &|r: &RtpMap| name(r) && rate(r),
            &|r: &RtpMap| name(r) && chans(r),
            &name,
        ];

        let matched = tiers.iter().find_map(|tier| {
            let matched: Vec<u8> = rtpmaps
                .iter()
                .filter(|rtpmap| tier(rtpmap))
                .map(|rtpmap| rtpmap.payload)
                .collect();

            (!matched.is_empty()).then_some(matched)
        });

        let Some(matched) = matched else {
            report.no_match(format!(
                "Cannot prefer {codec} in {kind} section {}, no payload type matches",
                section.index
            ));
            continue;
        };

        let is_matched = |fmt: &str| fmt.parse::<u8>().is_ok_and(|pt| matched.contains(&pt));

        let mut media = section.media.clone();
        let (mut fmts, rest): (Vec<_>, Vec<_>) =
            media.fmts.drain(..).partition(|fmt| is_matched(fmt));
        fmts.extend(rest);
        media.fmts = fmts;

        if media != section.media {
            log::info!(
                "[{}] Preferring {codec} in {kind} section {}, payload types {matched:?}",
                report.peer(),
                section.index
            );

            doc.set_media_line(&section, &media);
        }
    }
}
