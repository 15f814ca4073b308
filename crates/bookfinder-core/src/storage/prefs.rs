use serde::{Deserialize, Serialize};

use crate::models::{SearchHistoryEntry, SearchKind};

/// Maximum number of remembered searches.
pub const SEARCH_HISTORY_CAP: usize = 20;

// ─── Theme ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Invalid Theme: {s}")),
        }
    }
}

// ─── Search history ────────────────────────────────────────

/// Recent searches, newest first, unique by `(query, kind)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<SearchHistoryEntry>,
}

impl SearchHistory {
    pub fn entries(&self) -> &[SearchHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a search at the front, dropping any older entry for the same
    /// `(query, kind)` and anything beyond the cap.
    pub fn record(&mut self, query: &str, kind: SearchKind) {
        self.push_entry(SearchHistoryEntry::now(query, kind));
    }

    pub fn push_entry(&mut self, entry: SearchHistoryEntry) {
        self.entries.retain(|e| !e.matches(&entry.query, entry.kind));
        self.entries.insert(0, entry);
        self.entries.truncate(SEARCH_HISTORY_CAP);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
    }

    #[test]
    fn test_history_keeps_most_recent_twenty() {
        let mut history = SearchHistory::default();
        for i in 0..21 {
            history.record(&format!("query {i}"), SearchKind::Title);
        }
        assert_eq!(history.len(), SEARCH_HISTORY_CAP);
        assert_eq!(history.entries()[0].query, "query 20");
        assert_eq!(history.entries()[19].query, "query 1");
        assert!(!history.entries().iter().any(|e| e.query == "query 0"));
    }

    #[test]
    fn test_history_duplicate_moves_to_front() {
        let mut history = SearchHistory::default();
        history.record("dune", SearchKind::Title);
        history.record("herbert", SearchKind::Author);
        history.record("dune", SearchKind::Subject);
        history.record("dune", SearchKind::Title);

        assert_eq!(history.len(), 3);
        assert_eq!(history.entries()[0].query, "dune");
        assert_eq!(history.entries()[0].kind, SearchKind::Title);
        assert_eq!(history.entries()[1].kind, SearchKind::Subject);
    }

    #[test]
    fn test_history_clear() {
        let mut history = SearchHistory::default();
        history.record("dune", SearchKind::Title);
        history.clear();
        assert!(history.is_empty());
    }
}
