//! Individual rewrites of a [`SdpDocument`]
//!
//! Every transform works on the document in place and records conditions it could not handle in a [`Report`](crate::Report).
//! The [`Pipeline`](crate::Pipeline) runs them in a fixed order.

use sdp_lines::{FmtpParams, MediaSection, SdpDocument, attribute};

mod bandwidth;
mod candidates;
mod codec_order;
mod codec_params;
mod codec_remove;
mod negotiate;
mod reconcile;
mod rtx;

pub use bandwidth::limit_bandwidth;
pub use candidates::{
    CandidateFilter, filter_candidates, normalize_mcu_candidates, signal_end_of_candidates,
};
pub use codec_order::prefer_codec;
pub use codec_params::edit_codec_params;
pub use codec_remove::{RemovalPolicy, apply_removal_policy, remove_codec, remove_rtcp_feedback};
pub use negotiate::Negotiator;
pub use reconcile::{format_trailing_line, reconcile};
pub use rtx::filter_dangling_rtx;

/// Remove the rtpmap, fmtp and rtcp-fb lines of `payload_types` and their slots in the `m=` line
fn remove_payload_types(doc: &mut SdpDocument, section: &MediaSection, payload_types: &[u8]) {
    let mut media = section.media.clone();

    for &pt in payload_types {
        media.remove_payload_type(pt);
    }

    let lines: Vec<usize> = doc
        .attributes_matching(section, |name, value| {
            matches!(name, "rtpmap" | "fmtp" | "rtcp-fb")
                && value
                    .and_then(|value| value.split_ascii_whitespace().next())
                    .and_then(|pt| pt.parse::<u8>().ok())
                    .is_some_and(|pt| payload_types.contains(&pt))
        })
        .into_iter()
        .map(|(index, _)| index)
        .collect();

    if media != section.media {
        doc.set_media_line(section, &media);
    }

    doc.remove_all(&lines);
}

/// Write the fmtp line of `pt`
///
/// An existing line is replaced in place, otherwise the new line is inserted after the rtpmap line at
/// `rtpmap_line`. Empty parameters remove the fmtp line.
fn write_fmtp(
    doc: &mut SdpDocument,
    section: &MediaSection,
    pt: u8,
    params: &FmtpParams,
    rtpmap_line: usize,
) {
    let existing = doc.fmtp_for(section, pt).map(|(index, _)| index);

    match existing {
        Some(index) if params.is_empty() => {
            doc.remove(index);
        }
        Some(index) => {
            doc.replace(index, format!("a=fmtp:{pt} {params}"));
        }
        None if params.is_empty() => {}
        None => doc.insert(rtpmap_line + 1, format!("a=fmtp:{pt} {params}")),
    }
}

/// Returns if `line` is the attribute `name`
fn is_attribute(line: &str, name: &str) -> bool {
    attribute(line).is_some_and(|(n, _)| n == name)
}

/// Section at `index` of the current document state
fn section_at(doc: &SdpDocument, index: usize) -> Option<MediaSection> {
    doc.sections().into_iter().nth(index)
}
