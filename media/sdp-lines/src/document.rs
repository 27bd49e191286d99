use crate::attributes::attribute;
use crate::{MediaKind, MediaLine, MediaSection};
use bytesstr::BytesStr;
use std::fmt;
use std::ops::Range;

/// Line terminator used by a [`SdpDocument`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    CrLf,
    Lf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Line preserving SDP document
///
/// The document is an ordered list of lines. A document which ends with a line terminator has an empty last line,
/// which makes [`SdpDocument::parse`] and the [`fmt::Display`] implementation round-trip byte for byte.
///
/// Every `a=`, `b=` and `c=` line belongs to the nearest preceding `m=` line, or to the session level if there is
/// none. [`MediaSection`]s are views over these line runs and must be re-fetched after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdpDocument {
    lines: Vec<BytesStr>,
    line_ending: LineEnding,
}

impl SdpDocument {
    pub fn parse(src: &BytesStr) -> Self {
        let line_ending = if src.contains("\r\n") || !src.contains('\n') {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        let lines = src
            .split(line_ending.as_str())
            .map(|line| src.slice_ref(line))
            .collect();

        Self { lines, line_ending }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn lines(&self) -> &[BytesStr] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns if no line has content
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }

    pub fn line(&self, index: usize) -> Option<&BytesStr> {
        self.lines.get(index)
    }

    pub fn insert(&mut self, index: usize, line: impl Into<BytesStr>) {
        self.lines.insert(index, line.into());
    }

    pub fn remove(&mut self, index: usize) -> BytesStr {
        self.lines.remove(index)
    }

    pub fn replace(&mut self, index: usize, line: impl Into<BytesStr>) -> BytesStr {
        std::mem::replace(&mut self.lines[index], line.into())
    }

    /// Remove all lines for which `f` returns false
    pub fn retain(&mut self, mut f: impl FnMut(usize, &BytesStr) -> bool) {
        let mut index = 0;

        self.lines.retain(|line| {
            let keep = f(index, line);
            index += 1;
            keep
        });
    }

    /// Remove the lines at the given indices
    pub fn remove_all(&mut self, indices: &[usize]) {
        self.retain(|index, _| !indices.contains(&index));
    }

    /// Index after the last line with content, the position of the trailing terminator if there is one
    pub fn content_end(&self) -> usize {
        match self.lines.last() {
            Some(last) if last.trim().is_empty() => self.lines.len() - 1,
            _ => self.lines.len(),
        }
    }

    /// Append a line after the last line with content
    pub fn push_line(&mut self, line: impl Into<BytesStr>) {
        let index = self.content_end();
        self.lines.insert(index, line.into());
    }

    /// Returns if the document ends with a line terminator
    pub fn has_trailing_terminator(&self) -> bool {
        !self.is_empty() && self.lines.last().is_some_and(|line| line.is_empty())
    }

    /// Make sure the serialized document does or does not end with a line terminator
    pub fn set_trailing_terminator(&mut self, terminate: bool) {
        while self.lines.len() > 1 && self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }

        if terminate {
            self.lines.push(BytesStr::empty());
        }
    }

    /// Lines before the first media section
    pub fn session_range(&self) -> Range<usize> {
        let end = self
            .lines
            .iter()
            .position(|line| line.starts_with("m="))
            .unwrap_or(self.lines.len());

        0..end
    }

    /// Build the media section index of the document
    pub fn sections(&self) -> Vec<MediaSection> {
        let starts: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with("m="))
            .map(|(index, _)| index)
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(position, &start)| {
                let end = starts.get(position + 1).copied().unwrap_or(self.lines.len());
                let media = MediaLine::parse_lenient(&self.lines[start]);

                MediaSection {
                    index: position,
                    kind: MediaKind::from_token(&media.media),
                    media,
                    lines: start..end,
                }
            })
            .collect()
    }

    /// All sections of the given media kind
    pub fn sections_of(&self, kind: MediaKind) -> Vec<MediaSection> {
        self.sections()
            .into_iter()
            .filter(|section| section.kind == kind)
            .collect()
    }

    /// Attribute lines of a section for which `predicate` returns true
    ///
    /// The predicate receives the attribute name and its optional value.
    pub fn attributes_matching<'d>(
        &'d self,
        section: &MediaSection,
        mut predicate: impl FnMut(&str, Option<&str>) -> bool,
    ) -> Vec<(usize, &'d BytesStr)> {
        self.attributes_in(section.attribute_range(), &mut predicate)
    }

    /// Session level attribute lines for which `predicate` returns true
    pub fn session_attributes_matching<'d>(
        &'d self,
        mut predicate: impl FnMut(&str, Option<&str>) -> bool,
    ) -> Vec<(usize, &'d BytesStr)> {
        self.attributes_in(self.session_range(), &mut predicate)
    }

    fn attributes_in<'d>(
        &'d self,
        range: Range<usize>,
        predicate: &mut dyn FnMut(&str, Option<&str>) -> bool,
    ) -> Vec<(usize, &'d BytesStr)> {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);

        self.lines[start..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, line)| {
                let (name, value) = attribute(line)?;
                predicate(name, value).then_some((start + offset, line))
            })
            .collect()
    }

    /// First line in a section (including the `m=` line) starting with `prefix`
    pub fn find_in_section(&self, section: &MediaSection, prefix: &str) -> Option<usize> {
        section
            .lines
            .clone()
            .find(|&index| self.lines.get(index).is_some_and(|l| l.starts_with(prefix)))
    }

    /// The raw `m=` line of `section`
    pub fn media_line(&self, section: &MediaSection) -> &BytesStr {
        &self.lines[section.lines.start]
    }

    /// Replace the `m=` line of `section` with the rendered `media`
    pub fn set_media_line(&mut self, section: &MediaSection, media: &MediaLine) {
        self.lines[section.lines.start] = BytesStr::from(media.to_string());
    }
}

impl fmt::Display for SdpDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.lines.iter();

        if let Some(first) = iter.next() {
            f.write_str(first)?;

            for line in iter {
                f.write_str(self.line_ending.as_str())?;
                f.write_str(line)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const OFFER: &str = "v=0\r\n\
o=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0 1\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111 0\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:0\r\n\
a=rtpmap:111 opus/48000/2\r\n\
a=rtpmap:0 PCMU/8000\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:1\r\n\
a=rtpmap:96 VP8/90000\r\n";

    #[test]
    fn round_trip() {
        let src = BytesStr::from_static(OFFER);
        let doc = SdpDocument::parse(&src);

        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert!(doc.has_trailing_terminator());
        assert_eq!(doc.to_string(), OFFER);
    }

    #[test]
    fn round_trip_without_terminator_and_lf() {
        for input in ["v=0\r\ns=-", "v=0\ns=-\n", "", "v=0\r\n\r\n"] {
            let doc = SdpDocument::parse(&BytesStr::from_static(input));
            assert_eq!(doc.to_string(), input);
        }

        let doc = SdpDocument::parse(&BytesStr::from_static("v=0\ns=-\n"));
        assert_eq!(doc.line_ending(), LineEnding::Lf);
    }

    #[test]
    fn sections() {
        let doc = SdpDocument::parse(&BytesStr::from_static(OFFER));

        let sections = doc.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(doc.session_range(), 0..5);

        assert_eq!(sections[0].kind, MediaKind::Audio);
        assert_eq!(sections[0].lines, 5..10);
        assert_eq!(sections[0].media.fmts, ["111", "0"]);

        assert_eq!(sections[1].kind, MediaKind::Video);
        assert_eq!(sections[1].lines, 10..15);
    }

    #[test]
    fn attributes_matching() {
        let doc = SdpDocument::parse(&BytesStr::from_static(OFFER));
        let sections = doc.sections();

        let rtpmaps = doc.attributes_matching(&sections[0], |name, _| name == "rtpmap");
        assert_eq!(rtpmaps.len(), 2);
        assert_eq!(rtpmaps[0].0, 8);

        let none = doc.attributes_matching(&sections[1], |name, _| name == "fmtp");
        assert!(none.is_empty());

        let group = doc.session_attributes_matching(|name, _| name == "group");
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn empty_document() {
        let doc = SdpDocument::parse(&BytesStr::from_static("\r\n"));

        assert!(doc.is_empty());
        assert!(!doc.has_trailing_terminator());
        assert!(doc.sections().is_empty());
        assert_eq!(doc.to_string(), "\r\n");
    }

    #[test]
    fn push_line_keeps_terminator() {
        let mut doc = SdpDocument::parse(&BytesStr::from_static("v=0\r\ns=-\r\n"));

        doc.push_line("t=0 0");

        assert_eq!(doc.to_string(), "v=0\r\ns=-\r\nt=0 0\r\n");

        doc.set_trailing_terminator(false);
        assert_eq!(doc.to_string(), "v=0\r\ns=-\r\nt=0 0");

        doc.set_trailing_terminator(true);
        assert_eq!(doc.to_string(), "v=0\r\ns=-\r\nt=0 0\r\n");
    }
}
