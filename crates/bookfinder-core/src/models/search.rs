use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

/// Which catalog field a query targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Title,
    Author,
    Subject,
    Isbn,
    General,
}

impl SearchKind {
    /// Query-string parameter the search endpoint expects for this kind.
    pub fn query_param(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Subject => "subject",
            Self::Isbn => "isbn",
            Self::General => "q",
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Author => write!(f, "author"),
            Self::Subject => write!(f, "subject"),
            Self::Isbn => write!(f, "isbn"),
            Self::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "subject" => Ok(Self::Subject),
            "isbn" => Ok(Self::Isbn),
            "general" | "q" => Ok(Self::General),
            _ => Err(format!("Invalid SearchKind: {s}")),
        }
    }
}

/// One remembered search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    /// Local calendar date of the search, `YYYY-MM-DD`.
    pub date: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SearchHistoryEntry {
    pub fn now(query: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            query: query.into(),
            kind,
            date: Local::now().format("%Y-%m-%d").to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn matches(&self, query: &str, kind: SearchKind) -> bool {
        self.query == query && self.kind == kind
    }
}
