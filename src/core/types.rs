use serde::{Deserialize, Serialize};

/// Kind of identifier a citation carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Digital Object Identifier (`10.` prefix)
    Doi,
    /// ISBN-10 or ISBN-13
    Isbn,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doi => write!(f, "DOI"),
            Self::Isbn => write!(f, "ISBN"),
        }
    }
}

/// Categorical outcome of reconciling one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Title similarity cleared the threshold and an author matched
    Match,
    /// Exactly one of title or author cleared its threshold
    PartialMatch,
    /// Neither title nor author cleared its threshold
    NoMatch,
}

impl MatchStatus {
    #[must_use]
    pub fn from_signals(title_ok: bool, author_ok: bool) -> Self {
        match (title_ok, author_ok) {
            (true, true) => Self::Match,
            (true, false) | (false, true) => Self::PartialMatch,
            (false, false) => Self::NoMatch,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::PartialMatch => write!(f, "PARTIAL"),
            Self::NoMatch => write!(f, "NO MATCH"),
        }
    }
}
