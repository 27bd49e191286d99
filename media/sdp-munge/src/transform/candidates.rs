use crate::config::FilterSettings;
use crate::report::Report;
use bytesstr::BytesStr;
use sdp_lines::{Candidate, CandidateType, SdpDocument, attribute};

const END_OF_CANDIDATES: &str = "a=end-of-candidates";

/// Decides which ICE candidates are kept
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CandidateFilter {
    drop_host: bool,
    drop_srflx: bool,
    drop_relay: bool,
    /// Relay only was requested but lifted because of an MCU
    lifted: bool,
}

impl CandidateFilter {
    /// Build the filter from the settings
    ///
    /// Forcing relay candidates is not possible while an MCU is present, the filter then allows every candidate.
    pub fn new(settings: &FilterSettings, mcu_present: bool) -> Self {
        if settings.force_relay_only && mcu_present {
            return Self {
                lifted: true,
                ..Self::default()
            };
        }

        Self {
            drop_host: settings.drop_host || settings.force_relay_only,
            drop_srflx: settings.drop_srflx || settings.force_relay_only,
            drop_relay: settings.drop_relay,
            lifted: false,
        }
    }

    /// Returns if the filter keeps every candidate
    pub fn is_noop(&self) -> bool {
        !(self.drop_host || self.drop_srflx || self.drop_relay)
    }

    pub fn allows_type(&self, typ: &CandidateType) -> bool {
        match typ {
            CandidateType::Host => !self.drop_host,
            CandidateType::Srflx => !self.drop_srflx,
            CandidateType::Relay => !self.drop_relay,
            CandidateType::Prflx | CandidateType::Other(_) => true,
        }
    }

    /// Check a single candidate line, with or without the `a=` prefix
    ///
    /// Lines which cannot be parsed as candidate are allowed.
    pub fn allows(&self, line: &str) -> bool {
        let line = line.trim();
        let value = line.strip_prefix("a=").unwrap_or(line);

        let src = BytesStr::from(value.to_owned());

        match Candidate::from_value(&src, &src) {
            Ok(candidate) => self.allows_type(&candidate.typ),
            Err(_) => true,
        }
    }
}

/// Remove all candidate lines the filter does not allow
pub fn filter_candidates(doc: &mut SdpDocument, filter: &CandidateFilter, report: &mut Report) {
    if filter.lifted {
        report.degraded("Not forcing relay candidates, an MCU is present");
        return;
    }

    if filter.is_noop() {
        return;
    }

    let before = doc.len();

    doc.retain(|_, line| !is_candidate(line) || filter.allows(line));

    let removed = before - doc.len();

    if removed > 0 {
        log::info!("[{}] Removed {removed} candidates", report.peer());
    }
}

/// Mark the end of the candidate list of every media section
///
/// Existing markers are removed, a new one follows every run of candidate lines.
pub fn signal_end_of_candidates(doc: &mut SdpDocument, report: &mut Report) {
    doc.retain(|_, line| line.as_str() != END_OF_CANDIDATES);

    let run_ends: Vec<usize> = doc
        .lines()
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| is_candidate(&pair[0]) && !is_candidate(&pair[1]))
        .map(|(index, _)| index + 1)
        .chain(doc.lines().last().filter(|line| is_candidate(line)).map(|_| doc.len()))
        .collect();

    if run_ends.is_empty() {
        return;
    }

    log::debug!(
        "[{}] Signaling end of candidates in {} places",
        report.peer(),
        run_ends.len()
    );

    for index in run_ends.into_iter().rev() {
        doc.insert(index, END_OF_CANDIDATES);
    }
}

/// Rewrite candidates into the form MCUs accept from Firefox
///
/// Drops the `generation 0` extension and uses an uppercase `UDP` transport.
pub fn normalize_mcu_candidates(doc: &mut SdpDocument, report: &mut Report) {
    let mut changed = 0;

    for index in 0..doc.len() {
        let Some(line) = doc.line(index) else {
            break;
        };

        if !is_candidate(line) {
            continue;
        }

        let normalized = line.replace(" generation 0", "").replace(" udp ", " UDP ");

        if normalized != line.as_str() {
            doc.replace(index, normalized);
            changed += 1;
        }
    }

    if changed > 0 {
        log::debug!("[{}] Normalized {changed} candidates", report.peer());
    }
}

fn is_candidate(line: &str) -> bool {
    attribute(line).is_some_and(|(name, _)| name == "candidate")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::NoticeKind;

    const SDP: &str = "v=0\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=candidate:1 1 udp 2122260223 192.168.1.2 54400 typ host generation 0\r\n\
a=candidate:2 1 udp 1686052607 203.0.113.7 54400 typ srflx raddr 192.168.1.2 rport 54400 generation 0\r\n\
a=candidate:3 1 udp 41885439 198.51.100.9 3478 typ relay raddr 203.0.113.7 rport 54400 generation 0\r\n\
a=rtpmap:111 opus/48000/2\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=candidate:4 1 udp 2122260223 192.168.1.2 54401 typ host generation 0\r\n";

    fn parse() -> SdpDocument {
        SdpDocument::parse(&BytesStr::from_static(SDP))
    }

    fn candidates(doc: &SdpDocument) -> Vec<String> {
        doc.lines()
            .iter()
            .filter(|line| is_candidate(line))
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn relay_only() {
        let mut doc = parse();
        let mut report = Report::new("peer");

        let filter = CandidateFilter::new(
            &FilterSettings {
                force_relay_only: true,
                ..Default::default()
            },
            false,
        );

        filter_candidates(&mut doc, &filter, &mut report);

        let candidates = candidates(&doc);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].contains("typ relay"));
    }

    #[test]
    fn relay_only_lifted_by_mcu() {
        let mut doc = parse();
        let mut report = Report::new("peer");

        let filter = CandidateFilter::new(
            &FilterSettings {
                force_relay_only: true,
                ..Default::default()
            },
            true,
        );

        filter_candidates(&mut doc, &filter, &mut report);

        assert_eq!(doc.to_string(), SDP);
        assert!(report.contains(NoticeKind::Degraded));
    }

    #[test]
    fn single_lines() {
        let filter = CandidateFilter::new(
            &FilterSettings {
                drop_srflx: true,
                ..Default::default()
            },
            false,
        );

        assert!(filter.allows("candidate:1 1 udp 2122260223 192.168.1.2 54400 typ host"));
        assert!(!filter.allows(
            "a=candidate:2 1 udp 1686052607 203.0.113.7 54400 typ srflx raddr 192.168.1.2 rport 54400"
        ));
        assert!(filter.allows("a=candidate:garbage"));
    }

    #[test]
    fn end_of_candidates() {
        let mut doc = parse();
        let mut report = Report::new("peer");

        signal_end_of_candidates(&mut doc, &mut report);
        // running twice does not add more markers
        signal_end_of_candidates(&mut doc, &mut report);

        let lines = doc.lines();

        assert_eq!(lines[5], END_OF_CANDIDATES);
        assert_eq!(lines[10], END_OF_CANDIDATES);
        assert_eq!(
            lines.iter().filter(|l| l.as_str() == END_OF_CANDIDATES).count(),
            2
        );
        assert!(doc.has_trailing_terminator());
    }

    #[test]
    fn mcu_normalization() {
        let mut doc = parse();

        normalize_mcu_candidates(&mut doc, &mut Report::new("peer"));

        assert_eq!(
            doc.lines()[2],
            "a=candidate:1 1 UDP 2122260223 192.168.1.2 54400 typ host"
        );
        assert!(!doc.to_string().contains("generation"));
    }
}
