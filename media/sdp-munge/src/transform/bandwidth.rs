use super::{section_at, write_fmtp};
use crate::config::BandwidthSettings;
use crate::report::Report;
use sdp_lines::{MediaKind, SdpDocument};

const X_GOOGLE_MIN: &str = "x-google-min-bitrate";
const X_GOOGLE_MAX: &str = "x-google-max-bitrate";

/// Set the bandwidth lines of every section and the experimental video bitrate hints
///
/// Limits are written as `b=AS:<kbps>`, or as `b=TIAS:<kbps * 1024>` if `tias` is set.
pub fn limit_bandwidth(
    doc: &mut SdpDocument,
    settings: &BandwidthSettings,
    tias: bool,
    report: &mut Report,
) {
    for kind in [MediaKind::Audio, MediaKind::Video, MediaKind::Data] {
        if let Some(bandwidth) = settings.get(kind) {
            limit_kind(doc, kind, bandwidth, tias, report);
        }
    }

    if settings.video_min_bitrate.is_some() || settings.video_max_bitrate.is_some() {
        set_bitrate_hints(doc, settings, report);
    }
}

fn limit_kind(
    doc: &mut SdpDocument,
    kind: MediaKind,
    bandwidth: i32,
    tias: bool,
    report: &mut Report,
) {
    let sections = doc.sections_of(kind);

    if sections.is_empty() {
        log::debug!("[{}] No {kind} section to limit", report.peer());
        return;
    }

    if bandwidth <= 0 {
        report.degraded(format!(
            "Not limiting {kind} bandwidth, {bandwidth} is not a positive value"
        ));
    }

    for section in sections {
        // Re-fetch, removing lines moves all following sections
        let Some(section) = section_at(doc, section.index) else {
            break;
        };

        if doc.find_in_section(&section, "c=").is_none() {
            report.missing_structure(format!(
                "Cannot limit bandwidth of {kind} section {}, the connection line is missing",
                section.index
            ));
            continue;
        }

        let previous: Vec<usize> = section
            .attribute_range()
            .filter(|&index| {
                doc.line(index)
                    .is_some_and(|line| line.starts_with("b=AS:") || line.starts_with("b=TIAS:"))
            })
            .collect();

        doc.remove_all(&previous);

        if bandwidth <= 0 {
            continue;
        }

        let Some(section) = section_at(doc, section.index) else {
            break;
        };

        let Some(c_line) = doc.find_in_section(&section, "c=") else {
            continue;
        };

        let line = if tias {
            format!("b=TIAS:{}", i64::from(bandwidth) * 1024)
        } else {
            format!("b=AS:{bandwidth}")
        };

        log::info!(
            "[{}] Limiting {kind} section {} with {line}",
            report.peer(),
            section.index
        );

        doc.insert(c_line + 1, line);
    }
}

/// Replace the `x-google-*-bitrate` parameters of the first payload type of the first video section
fn set_bitrate_hints(doc: &mut SdpDocument, settings: &BandwidthSettings, report: &mut Report) {
    let Some(section) = doc.sections_of(MediaKind::Video).into_iter().next() else {
        report.missing_structure("Cannot set video bitrate hints, there is no video section");
        return;
    };

    let Some(pt) = section.media.payload_types().next() else {
        report.missing_structure("Cannot set video bitrate hints, the video section has no payload type");
        return;
    };

    let Some((rtpmap_line, _)) = doc.rtpmap_for(&section, pt) else {
        report.missing_structure(format!(
            "Cannot set video bitrate hints, payload type {pt} has no rtpmap"
        ));
        return;
    };

    let mut params = doc
        .fmtp_for(&section, pt)
        .map(|(_, fmtp)| fmtp.params())
        .unwrap_or_default();

    params.remove(X_GOOGLE_MIN);
    params.remove(X_GOOGLE_MAX);

    if let Some(min) = settings.video_min_bitrate {
        params.set(X_GOOGLE_MIN, Some(min.to_string()));
    }

    if let Some(max) = settings.video_max_bitrate {
        params.set(X_GOOGLE_MAX, Some(max.to_string()));
    }

    log::info!(
        "[{}] Setting video bitrate hints of payload type {pt} to {params}",
        report.peer()
    );

    write_fmtp(doc, &section, pt, &params, rtpmap_line);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::NoticeKind;
    use bytesstr::BytesStr;

    const OFFER: &str = "v=0\r\n\
o=- 1 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
c=IN IP4 0.0.0.0\r\n\
a=rtpmap:111 opus/48000/2\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n\
c=IN IP4 0.0.0.0\r\n\
b=AS:2000\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=fmtp:96 x-google-min-bitrate=10;max-fr=30\r\n\
a=rtpmap:97 rtx/90000\r\n\
a=fmtp:97 apt=96\r\n\
m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
a=sctp-port:5000\r\n";

    fn limit(settings: BandwidthSettings, tias: bool) -> (SdpDocument, Report) {
        let mut doc = SdpDocument::parse(&BytesStr::from_static(OFFER));
        let mut report = Report::new("peer");

        limit_bandwidth(&mut doc, &settings, tias, &mut report);

        (doc, report)
    }

    #[test]
    fn replaces_existing_limit() {
        let (doc, report) = limit(
            BandwidthSettings {
                video: Some(500),
                ..Default::default()
            },
            false,
        );

        let video = &doc.sections()[1];

        let lines: Vec<&str> = doc.lines()[video.lines.clone()]
            .iter()
            .map(|line| line.as_str())
            .collect();

        assert_eq!(lines[1], "c=IN IP4 0.0.0.0");
        assert_eq!(lines[2], "b=AS:500");
        assert_eq!(lines.iter().filter(|l| l.starts_with("b=")).count(), 1);
        assert!(report.is_empty());
    }

    #[test]
    fn tias() {
        let (doc, _) = limit(
            BandwidthSettings {
                audio: Some(50),
                ..Default::default()
            },
            true,
        );

        assert_eq!(doc.lines()[6], "b=TIAS:51200");
    }

    #[test]
    fn missing_connection_line() {
        let (doc, report) = limit(
            BandwidthSettings {
                data: Some(100),
                ..Default::default()
            },
            false,
        );

        assert_eq!(doc.to_string(), OFFER);
        assert!(report.contains(NoticeKind::MissingStructure));
    }

    #[test]
    fn non_positive_only_removes() {
        let (doc, report) = limit(
            BandwidthSettings {
                video: Some(0),
                ..Default::default()
            },
            false,
        );

        assert!(!doc.to_string().contains("b=AS"));
        assert!(report.contains(NoticeKind::Degraded));
    }

    #[test]
    fn bitrate_hints() {
        let (doc, _) = limit(
            BandwidthSettings {
                video_min_bitrate: Some(100),
                video_max_bitrate: Some(900),
                ..Default::default()
            },
            false,
        );

        assert_eq!(
            doc.lines()[11],
            "a=fmtp:96 max-fr=30;x-google-min-bitrate=100;x-google-max-bitrate=900"
        );
    }

    #[test]
    fn bitrate_hints_synthesize_fmtp() {
        let mut doc = SdpDocument::parse(&BytesStr::from_static(
            "v=0\r\nm=video 9 RTP/AVPF 100\r\na=rtpmap:100 H264/90000\r\n",
        ));
        let mut report = Report::new("peer");

        limit_bandwidth(
            &mut doc,
            &BandwidthSettings {
                video_max_bitrate: Some(800),
                ..Default::default()
            },
            false,
            &mut report,
        );

        assert_eq!(
            doc.to_string(),
            "v=0\r\nm=video 9 RTP/AVPF 100\r\na=rtpmap:100 H264/90000\r\na=fmtp:100 x-google-max-bitrate=800\r\n"
        );
    }
}
