use std::fmt;

/// Class of a non-fatal condition encountered while rewriting a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// A line the rewrite depends on is absent, the rewrite was skipped
    MissingStructure,
    /// The requested codec, candidate or preference had nothing to act on
    NoMatch,
    /// A setting could not be honored and was replaced by a safer choice
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Non-fatal conditions collected during one negotiation step
///
/// Every notice is logged when it is pushed.
#[derive(Debug, Default, Clone)]
pub struct Report {
    peer: String,
    notices: Vec<Notice>,
}

impl Report {
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            notices: vec![],
        }
    }

    /// Id of the peer the report belongs to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Returns if a notice of the given kind was recorded
    pub fn contains(&self, kind: NoticeKind) -> bool {
        self.notices.iter().any(|notice| notice.kind == kind)
    }

    pub fn missing_structure(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::MissingStructure, message.into());
    }

    pub fn no_match(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::NoMatch, message.into());
    }

    pub fn degraded(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Degraded, message.into());
    }

    fn push(&mut self, kind: NoticeKind, message: String) {
        match kind {
            NoticeKind::MissingStructure | NoticeKind::Degraded => {
                log::warn!("[{}] {message}", self.peer)
            }
            NoticeKind::NoMatch => log::debug!("[{}] {message}", self.peer),
        }

        self.notices.push(Notice { kind, message });
    }
}
