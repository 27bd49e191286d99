//! Read-only queries over a negotiated document

use sdp_lines::{Fingerprint, MediaKind, SdpDocument, attribute};

/// Codec selected for a media kind, the first payload type of its first section
///
/// Every field is `None` if it could not be resolved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectedCodec {
    pub name: Option<String>,
    pub clock_rate: Option<u32>,
    pub channels: Option<u32>,
    pub payload_type: Option<u8>,
    /// Raw parameters of the fmtp line
    pub parameters: Option<String>,
}

pub fn selected_codec(doc: &SdpDocument, kind: MediaKind) -> SelectedCodec {
    let Some(section) = doc.sections_of(kind).into_iter().next() else {
        return SelectedCodec::default();
    };

    let Some(pt) = section.media.payload_types().next() else {
        return SelectedCodec::default();
    };

    let mut selected = SelectedCodec {
        payload_type: Some(pt),
        ..SelectedCodec::default()
    };

    if let Some((_, rtpmap)) = doc.rtpmap_for(&section, pt) {
        selected.name = Some(rtpmap.encoding.to_string());
        selected.clock_rate = Some(rtpmap.clock_rate);
        selected.channels = rtpmap.channels;
    }

    if let Some((_, fmtp)) = doc.fmtp_for(&section, pt) {
        selected.parameters = Some(fmtp.params.to_string());
    }

    selected
}

/// The first `a=fingerprint` attribute of the session or any media section
pub fn fingerprint(doc: &SdpDocument) -> Option<Fingerprint> {
    doc.lines().iter().find_map(|line| {
        let (name, value) = attribute(line)?;

        if name != "fingerprint" {
            return None;
        }

        Fingerprint::from_value(line, value?.trim_end()).ok()
    })
}
