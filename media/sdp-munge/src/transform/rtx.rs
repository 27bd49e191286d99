use super::{remove_payload_types, section_at};
use crate::report::Report;
use sdp_lines::SdpDocument;

/// Remove retransmission payload types whose associated payload type no longer exists
///
/// A payload type counts as retransmission if its rtpmap names `rtx` or its fmtp carries an `apt`.
/// It is kept only if the `apt` payload type has a non-rtx rtpmap in the same section.
pub fn filter_dangling_rtx(doc: &mut SdpDocument, report: &mut Report) {
    for index in 0..doc.sections().len() {
        let Some(section) = section_at(doc, index) else {
            break;
        };

        let rtpmaps = doc.rtpmaps(&section);
        let bindings = doc.rtx_bindings(&section);

        let resolves = |apt: u8| {
            rtpmaps
                .iter()
                .any(|(_, rtpmap)| rtpmap.payload == apt && !rtpmap.is_rtx())
        };

        let mut dangling: Vec<u8> = rtpmaps
            .iter()
            .filter(|(_, rtpmap)| rtpmap.is_rtx())
            .map(|(_, rtpmap)| rtpmap.payload)
            .filter(|&rtx| {
                !bindings
                    .iter()
                    .any(|binding| binding.rtx == rtx && resolves(binding.apt))
            })
            .collect();

        for binding in &bindings {
            if !resolves(binding.apt) && !dangling.contains(&binding.rtx) {
                dangling.push(binding.rtx);
            }
        }

        if dangling.is_empty() {
            continue;
        }

        log::info!(
            "[{}] Removing retransmission payload types {dangling:?} of section {index}, their associated payload type is gone",
            report.peer()
        );

        remove_payload_types(doc, &section, &dangling);
    }
}
