use crate::attributes::attribute;
use crate::{Fmtp, MediaKind, MediaLine, RtpMap, SdpDocument, Ssrc};
use std::ops::Range;

/// View over the lines of a single media description
///
/// Only valid for the [`SdpDocument`] state it was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSection {
    /// Position of the section inside the document
    pub index: usize,
    pub kind: MediaKind,
    /// The parsed `m=` line
    pub media: MediaLine,
    /// Line indices of the section, starting with the `m=` line
    pub lines: Range<usize>,
}

impl MediaSection {
    /// Line indices of the section without the `m=` line
    pub fn attribute_range(&self) -> Range<usize> {
        self.lines.start + 1..self.lines.end
    }

    /// Returns if the section was rejected using port 0
    pub fn is_rejected(&self) -> bool {
        self.media.port == 0
    }
}

/// Retransmission payload type bound to the payload type it retransmits (`a=fmtp:<rtx> apt=<apt>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtxBinding {
    pub rtx: u8,
    pub apt: u8,
}

impl SdpDocument {
    /// All rtpmap attributes of a section with their line index
    pub fn rtpmaps(&self, section: &MediaSection) -> Vec<(usize, RtpMap)> {
        self.section_lines(section)
            .filter_map(|(index, line)| {
                let (name, value) = attribute(line)?;

                if name != "rtpmap" {
                    return None;
                }

                RtpMap::from_value(line, value?).ok().map(|rtpmap| (index, rtpmap))
            })
            .collect()
    }

    /// All fmtp attributes of a section with their line index
    pub fn fmtps(&self, section: &MediaSection) -> Vec<(usize, Fmtp)> {
        self.section_lines(section)
            .filter_map(|(index, line)| {
                let (name, value) = attribute(line)?;

                if name != "fmtp" {
                    return None;
                }

                Fmtp::from_value(line, value?).ok().map(|fmtp| (index, fmtp))
            })
            .collect()
    }

    /// The rtpmap attribute for `pt` in the section
    pub fn rtpmap_for(&self, section: &MediaSection, pt: u8) -> Option<(usize, RtpMap)> {
        self.rtpmaps(section)
            .into_iter()
            .find(|(_, rtpmap)| rtpmap.payload == pt)
    }

    /// The fmtp attribute for `pt` in the section
    pub fn fmtp_for(&self, section: &MediaSection, pt: u8) -> Option<(usize, Fmtp)> {
        self.fmtps(section)
            .into_iter()
            .find(|(_, fmtp)| fmtp.format == pt)
    }

    /// rtcp-fb attribute line indices for `pt` in the section
    pub fn rtcp_fb_for(&self, section: &MediaSection, pt: u8) -> Vec<usize> {
        self.attributes_matching(section, |name, value| {
            name == "rtcp-fb"
                && value
                    .and_then(|value| value.split_ascii_whitespace().next())
                    .is_some_and(|fb_pt| fb_pt.parse::<u8>() == Ok(pt))
        })
        .into_iter()
        .map(|(index, _)| index)
        .collect()
    }

    /// ssrc attributes of a section with their line index
    pub fn ssrcs(&self, section: &MediaSection) -> Vec<(usize, Ssrc)> {
        self.section_lines(section)
            .filter_map(|(index, line)| {
                let (name, value) = attribute(line)?;

                if name != "ssrc" {
                    return None;
                }

                Ssrc::from_value(line, value?).ok().map(|ssrc| (index, ssrc))
            })
            .collect()
    }

    /// Build the retransmission relation of a section
    pub fn rtx_bindings(&self, section: &MediaSection) -> Vec<RtxBinding> {
        self.fmtps(section)
            .into_iter()
            .filter_map(|(_, fmtp)| {
                fmtp.params().apt().map(|apt| RtxBinding {
                    rtx: fmtp.format,
                    apt,
                })
            })
            .collect()
    }

    /// Value of the section's `a=mid` attribute
    pub fn mid(&self, section: &MediaSection) -> Option<&str> {
        self.attributes_matching(section, |name, _| name == "mid")
            .into_iter()
            .find_map(|(_, line)| attribute(line)?.1)
            .map(str::trim)
    }

    fn section_lines<'d>(
        &'d self,
        section: &MediaSection,
    ) -> impl Iterator<Item = (usize, &'d bytesstr::BytesStr)> + 'd {
        let range = section.attribute_range();

        self.lines()
            .iter()
            .enumerate()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
    }
}
